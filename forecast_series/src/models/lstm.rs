//! LSTM network for one-step-ahead forecasting
//!
//! Stacked LSTM layers read a window of min-max scaled observations, a linear
//! dense layer and a single linear output produce the next scaled value.
//! Training uses full backpropagation through time with mini-batch Adam.
//! Multi-step forecasts are produced recursively by feeding predictions back
//! into the input window.

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use chrono::{DateTime, Utc};
use ndarray::{s, Array1, Array2, ArrayViewD, ArrayViewMutD, Axis, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use series_math::MinMaxScaler;
use tracing::debug;

/// Configuration of the LSTM forecaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LstmConfig {
    /// Number of past observations fed to the network
    pub sequence_length: usize,
    /// Units of each stacked LSTM layer, bottom first
    pub hidden_sizes: Vec<usize>,
    /// Units of the dense layer between the last LSTM layer and the output
    pub dense_units: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Seed for weight initialization and shuffling
    pub seed: u64,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            sequence_length: 60,
            hidden_sizes: vec![50, 50],
            dense_units: 25,
            epochs: 10,
            batch_size: 32,
            learning_rate: 0.001,
            seed: 42,
        }
    }
}

impl LstmConfig {
    /// Check the configuration for values the network cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.sequence_length == 0 || self.epochs == 0 || self.batch_size == 0 || self.dense_units == 0 {
            return Err(ForecastError::InvalidParameter(
                "LSTM sequence length, epochs, batch size and dense units must be positive".to_string(),
            ));
        }
        if self.hidden_sizes.is_empty() || self.hidden_sizes.contains(&0) {
            return Err(ForecastError::InvalidParameter(format!(
                "LSTM needs at least one layer with positive size, got {:?}",
                self.hidden_sizes
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "Learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Glorot uniform initialization for a `(fan_out, fan_in)` matrix
fn glorot(rows: usize, cols: usize, rng: &mut StdRng) -> Array2<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-limit..limit))
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    a.view()
        .insert_axis(Axis(1))
        .dot(&b.view().insert_axis(Axis(0)))
}

/// Activations of one LSTM step, kept for the backward pass
#[derive(Debug)]
struct StepCache {
    x: Array1<f64>,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    tanh_c: Array1<f64>,
}

/// LSTM layer with gates stacked as `[input, forget, candidate, output]`
#[derive(Debug, Clone)]
struct LstmLayer {
    /// Input weights `(4H, I)`
    w: Array2<f64>,
    /// Recurrent weights `(4H, H)`
    u: Array2<f64>,
    b: Array1<f64>,
}

impl LstmLayer {
    fn new(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Self {
        let mut b = Array1::<f64>::zeros(4 * hidden_size);
        // Forget gate starts open
        b.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);
        Self {
            w: glorot(4 * hidden_size, input_size, rng),
            u: glorot(4 * hidden_size, hidden_size, rng),
            b,
        }
    }

    fn zeros_like(&self) -> Self {
        Self {
            w: Array2::zeros(self.w.raw_dim()),
            u: Array2::zeros(self.u.raw_dim()),
            b: Array1::zeros(self.b.raw_dim()),
        }
    }

    fn hidden_size(&self) -> usize {
        self.u.ncols()
    }

    fn forward(&self, inputs: &[Array1<f64>]) -> (Vec<Array1<f64>>, Vec<StepCache>) {
        let n = self.hidden_size();
        let mut h = Array1::<f64>::zeros(n);
        let mut c = Array1::<f64>::zeros(n);
        let mut outputs = Vec::with_capacity(inputs.len());
        let mut caches = Vec::with_capacity(inputs.len());

        for x in inputs {
            let z = self.w.dot(x) + self.u.dot(&h) + &self.b;
            let i = z.slice(s![0..n]).mapv(sigmoid);
            let f = z.slice(s![n..2 * n]).mapv(sigmoid);
            let g = z.slice(s![2 * n..3 * n]).mapv(f64::tanh);
            let o = z.slice(s![3 * n..]).mapv(sigmoid);

            let c_next = &f * &c + &i * &g;
            let tanh_c = c_next.mapv(f64::tanh);
            let h_next = &o * &tanh_c;

            outputs.push(h_next.clone());
            caches.push(StepCache {
                x: x.clone(),
                h_prev: h,
                c_prev: c,
                i,
                f,
                g,
                o,
                tanh_c,
            });
            h = h_next;
            c = c_next;
        }

        (outputs, caches)
    }

    /// Backpropagate through time. `d_outputs` holds the loss gradient with
    /// respect to each emitted hidden state; returns the gradient with respect
    /// to each input.
    fn backward(&self, caches: &[StepCache], d_outputs: &[Array1<f64>], grads: &mut LstmLayer) -> Vec<Array1<f64>> {
        let n = self.hidden_size();
        let mut dh_next = Array1::<f64>::zeros(n);
        let mut dc_next = Array1::<f64>::zeros(n);
        let mut d_inputs = vec![Array1::<f64>::zeros(self.w.ncols()); caches.len()];

        for t in (0..caches.len()).rev() {
            let cache = &caches[t];
            let dh = &d_outputs[t] + &dh_next;

            let d_o = &dh * &cache.tanh_c;
            let dc = &dh * &cache.o * &cache.tanh_c.mapv(|v| 1.0 - v * v) + &dc_next;
            let d_i = &dc * &cache.g;
            let d_g = &dc * &cache.i;
            let d_f = &dc * &cache.c_prev;
            dc_next = &dc * &cache.f;

            let mut dz = Array1::<f64>::zeros(4 * n);
            dz.slice_mut(s![0..n]).assign(&(&d_i * &cache.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![n..2 * n]).assign(&(&d_f * &cache.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![2 * n..3 * n]).assign(&(&d_g * &cache.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![3 * n..]).assign(&(&d_o * &cache.o.mapv(|v| v * (1.0 - v))));

            grads.w += &outer(&dz, &cache.x);
            grads.u += &outer(&dz, &cache.h_prev);
            grads.b += &dz;

            d_inputs[t] = self.w.t().dot(&dz);
            dh_next = self.u.t().dot(&dz);
        }

        d_inputs
    }
}

/// Fully connected linear layer
#[derive(Debug, Clone)]
struct DenseLayer {
    w: Array2<f64>,
    b: Array1<f64>,
}

impl DenseLayer {
    fn new(input_size: usize, output_size: usize, rng: &mut StdRng) -> Self {
        Self {
            w: glorot(output_size, input_size, rng),
            b: Array1::zeros(output_size),
        }
    }

    fn zeros_like(&self) -> Self {
        Self {
            w: Array2::zeros(self.w.raw_dim()),
            b: Array1::zeros(self.b.raw_dim()),
        }
    }

    fn forward(&self, x: &Array1<f64>) -> Array1<f64> {
        self.w.dot(x) + &self.b
    }

    fn backward(&self, x: &Array1<f64>, dy: &Array1<f64>, grads: &mut DenseLayer) -> Array1<f64> {
        grads.w += &outer(dy, x);
        grads.b += dy;
        self.w.t().dot(dy)
    }
}

/// LSTM stack, dense layer and scalar output
#[derive(Debug, Clone)]
struct Network {
    lstm: Vec<LstmLayer>,
    dense: DenseLayer,
    output: DenseLayer,
}

impl Network {
    fn new(config: &LstmConfig, rng: &mut StdRng) -> Self {
        let mut lstm = Vec::with_capacity(config.hidden_sizes.len());
        let mut input_size = 1;
        for &hidden in &config.hidden_sizes {
            lstm.push(LstmLayer::new(input_size, hidden, rng));
            input_size = hidden;
        }
        let dense = DenseLayer::new(input_size, config.dense_units, rng);
        let output = DenseLayer::new(config.dense_units, 1, rng);
        Self { lstm, dense, output }
    }

    fn zeros_like(&self) -> Self {
        Self {
            lstm: self.lstm.iter().map(LstmLayer::zeros_like).collect(),
            dense: self.dense.zeros_like(),
            output: self.output.zeros_like(),
        }
    }

    fn inputs(window: &[f64]) -> Vec<Array1<f64>> {
        window.iter().map(|v| Array1::from_elem(1, *v)).collect()
    }

    fn predict(&self, window: &[f64]) -> f64 {
        let mut sequence = Self::inputs(window);
        for layer in &self.lstm {
            sequence = layer.forward(&sequence).0;
        }
        let last = sequence.last().cloned().unwrap_or_else(|| Array1::zeros(0));
        self.output.forward(&self.dense.forward(&last))[0]
    }

    /// Add the gradient of `scale * (prediction - target)^2` to `grads` and
    /// return the squared error
    fn accumulate_gradients(&self, window: &[f64], target: f64, scale: f64, grads: &mut Network) -> f64 {
        let mut sequence = Self::inputs(window);
        let mut caches = Vec::with_capacity(self.lstm.len());
        for layer in &self.lstm {
            let (outputs, layer_caches) = layer.forward(&sequence);
            caches.push(layer_caches);
            sequence = outputs;
        }

        let steps = sequence.len();
        let last = sequence[steps - 1].clone();
        let hidden = self.dense.forward(&last);
        let prediction = self.output.forward(&hidden)[0];
        let error = prediction - target;

        let d_prediction = Array1::from_elem(1, 2.0 * error * scale);
        let d_hidden = self.output.backward(&hidden, &d_prediction, &mut grads.output);
        let d_last = self.dense.backward(&last, &d_hidden, &mut grads.dense);

        // Only the final hidden state of the top layer feeds the dense head
        let mut d_outputs = vec![Array1::<f64>::zeros(last.len()); steps];
        d_outputs[steps - 1] = d_last;
        for (idx, layer) in self.lstm.iter().enumerate().rev() {
            d_outputs = layer.backward(&caches[idx], &d_outputs, &mut grads.lstm[idx]);
        }

        error * error
    }

    fn tensors(&self) -> Vec<ArrayViewD<'_, f64>> {
        let mut out = Vec::new();
        for LstmLayer { w, u, b } in &self.lstm {
            out.push(w.view().into_dyn());
            out.push(u.view().into_dyn());
            out.push(b.view().into_dyn());
        }
        for DenseLayer { w, b } in [&self.dense, &self.output] {
            out.push(w.view().into_dyn());
            out.push(b.view().into_dyn());
        }
        out
    }

    fn tensors_mut(&mut self) -> Vec<ArrayViewMutD<'_, f64>> {
        let mut out = Vec::new();
        for LstmLayer { w, u, b } in &mut self.lstm {
            out.push(w.view_mut().into_dyn());
            out.push(u.view_mut().into_dyn());
            out.push(b.view_mut().into_dyn());
        }
        for DenseLayer { w, b } in [&mut self.dense, &mut self.output] {
            out.push(w.view_mut().into_dyn());
            out.push(b.view_mut().into_dyn());
        }
        out
    }
}

/// Adam optimizer state
#[derive(Debug)]
struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
    m: Network,
    v: Network,
}

impl Adam {
    fn new(network: &Network, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            m: network.zeros_like(),
            v: network.zeros_like(),
        }
    }

    fn update(&mut self, network: &mut Network, grads: &Network) {
        self.step += 1;
        let (beta1, beta2, lr, eps) = (self.beta1, self.beta2, self.learning_rate, self.epsilon);
        let bias1 = 1.0 - beta1.powi(self.step);
        let bias2 = 1.0 - beta2.powi(self.step);

        let params = network.tensors_mut();
        let grads = grads.tensors();
        let moments = self.m.tensors_mut();
        let velocities = self.v.tensors_mut();

        for (((mut p, g), mut m), mut v) in params.into_iter().zip(grads).zip(moments).zip(velocities) {
            Zip::from(&mut p)
                .and(&g)
                .and(&mut m)
                .and(&mut v)
                .for_each(|p, &g, m, v| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    let m_hat = *m / bias1;
                    let v_hat = *v / bias2;
                    *p -= lr * m_hat / (v_hat.sqrt() + eps);
                });
        }
    }
}

/// Per-epoch losses on the scaled data
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingHistory {
    pub train_loss: Vec<f64>,
    /// Empty when the validation partition yields no windows
    pub validation_loss: Vec<f64>,
}

/// LSTM forecasting model
#[derive(Debug, Clone)]
pub struct LstmModel {
    config: LstmConfig,
}

impl LstmModel {
    pub fn new(config: LstmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LstmConfig {
        &self.config
    }
}

impl Default for LstmModel {
    fn default() -> Self {
        Self {
            config: LstmConfig::default(),
        }
    }
}

fn mean_squared_error(network: &Network, scaled: &[f64], targets: &[usize], seq: usize) -> f64 {
    let total: f64 = targets
        .iter()
        .map(|&j| (network.predict(&scaled[j - seq..j]) - scaled[j]).powi(2))
        .sum();
    total / targets.len() as f64
}

impl ForecastModel for LstmModel {
    type Trained = TrainedLstmModel;

    fn train(&self, train: &TimeSeries, validation: &TimeSeries) -> Result<TrainedLstmModel> {
        let seq = self.config.sequence_length;
        if train.len() < seq + 1 {
            return Err(ForecastError::insufficient(
                seq + 1,
                train.len(),
                "LSTM training observations",
            ));
        }

        // Scaling parameters come from the training partition only
        let scaler = MinMaxScaler::fit(train.values())?;
        let history = train.concat(validation)?;
        let scaled = scaler.transform(history.values());

        let train_targets: Vec<usize> = (seq..train.len()).collect();
        let validation_targets: Vec<usize> = (train.len()..history.len()).collect();

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut network = Network::new(&self.config, &mut rng);
        let mut adam = Adam::new(&network, self.config.learning_rate);
        let mut order = train_targets.clone();
        let mut training_history = TrainingHistory::default();

        for epoch in 0..self.config.epochs {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for batch in order.chunks(self.config.batch_size) {
                let mut grads = network.zeros_like();
                let scale = 1.0 / batch.len() as f64;
                for &j in batch {
                    epoch_loss += network.accumulate_gradients(&scaled[j - seq..j], scaled[j], scale, &mut grads);
                }
                adam.update(&mut network, &grads);
            }

            let train_loss = epoch_loss / train_targets.len() as f64;
            if !train_loss.is_finite() {
                return Err(ForecastError::model_fit(
                    "LSTM",
                    format!("training loss became non-finite in epoch {}", epoch + 1),
                ));
            }
            training_history.train_loss.push(train_loss);

            if validation_targets.is_empty() {
                debug!("LSTM epoch {}/{}: loss {:.6}", epoch + 1, self.config.epochs, train_loss);
            } else {
                let val_loss = mean_squared_error(&network, &scaled, &validation_targets, seq);
                training_history.validation_loss.push(val_loss);
                debug!(
                    "LSTM epoch {}/{}: loss {:.6}, val_loss {:.6}",
                    epoch + 1,
                    self.config.epochs,
                    train_loss,
                    val_loss
                );
            }
        }

        Ok(TrainedLstmModel {
            network,
            scaler,
            sequence_length: seq,
            last_window: scaled[scaled.len() - seq..].to_vec(),
            history: training_history,
        })
    }

    fn name(&self) -> &str {
        "LSTM"
    }
}

/// Trained LSTM model
#[derive(Debug, Clone)]
pub struct TrainedLstmModel {
    network: Network,
    scaler: MinMaxScaler,
    sequence_length: usize,
    /// Last scaled observations before the forecast origin
    last_window: Vec<f64>,
    history: TrainingHistory,
}

impl TrainedLstmModel {
    /// Losses recorded during training
    pub fn training_history(&self) -> &TrainingHistory {
        &self.history
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }
}

impl TrainedForecastModel for TrainedLstmModel {
    fn forecast(&self, timestamps: &[DateTime<Utc>]) -> Result<ForecastResult> {
        let seq = self.sequence_length;
        let mut buffer = self.last_window.clone();
        buffer.reserve(timestamps.len());

        for _ in timestamps {
            let next = self.network.predict(&buffer[buffer.len() - seq..]);
            if !next.is_finite() {
                return Err(ForecastError::model_fit("LSTM", "prediction is not finite"));
            }
            buffer.push(next);
        }

        let values = self.scaler.inverse_transform(&buffer[seq..]);
        ForecastResult::new(values, timestamps.to_vec())
    }

    fn name(&self) -> &str {
        "LSTM"
    }
}
