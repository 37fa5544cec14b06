//! Line-oriented advisor dialogue
//!
//! A [`Session`] reads answers from any `BufRead` and writes prompts and
//! results to any `Write`, so the same loop serves stdin/stdout and tests.
//! Invalid answers are reported and asked again; end of input ends the
//! session quietly.

use crate::{format_currency, recommended_percentage, Allocation, Result};
use std::io::{BufRead, Write};
use tracing::debug;

/// How a dialogue finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user declined another allocation
    Finished,
    /// Input ran out mid-dialogue
    EndOfInput,
}

/// Interactive salary allocation dialogue
pub struct Session<R: BufRead, W: Write> {
    input: R,
    output: W,
    completed: usize,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            completed: 0,
        }
    }

    /// Allocations shown so far
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Give back the output sink
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the user stops or input ends
    pub fn run(&mut self) -> Result<SessionEnd> {
        writeln!(self.output, "🤖 Welcome to the Salary Allocation AI Engine! 💰")?;
        writeln!(
            self.output,
            "I'll help you divide your salary into investing and management portions.\n"
        )?;

        loop {
            let Some(salary) = self.ask_salary()? else {
                return Ok(SessionEnd::EndOfInput);
            };

            let recommended = Allocation::recommended(salary)?;
            writeln!(
                self.output,
                "\n💡 Based on your salary of {}, I recommend:",
                format_currency(salary)
            )?;
            writeln!(
                self.output,
                "Investing: {}% ({})",
                recommended.percent(),
                format_currency(recommended.invest())
            )?;
            writeln!(
                self.output,
                "Management: {}% ({})",
                100.0 - recommended.percent(),
                format_currency(recommended.manage())
            )?;

            let Some(choice) = self.ask_choice()? else {
                return Ok(SessionEnd::EndOfInput);
            };
            let custom = choice == 2;
            let percent = if custom {
                match self.ask_percentage()? {
                    Some(p) => p,
                    None => return Ok(SessionEnd::EndOfInput),
                }
            } else {
                recommended_percentage(salary)
            };

            let allocation = Allocation::new(salary, percent)?;
            self.show(&allocation, custom)?;
            self.completed += 1;
            debug!(
                "Allocation {}: {} at {}%",
                self.completed,
                allocation.salary(),
                allocation.percent()
            );

            let again = self.prompt("\nWould you like to make another allocation? (y/n): ")?;
            match again {
                Some(answer) if answer.trim().eq_ignore_ascii_case("y") => {
                    writeln!(self.output, "\n{}\n", "=".repeat(50))?;
                }
                Some(_) => {
                    writeln!(
                        self.output,
                        "\n💡 Financial Tip: Remember to regularly review your allocations as your income or goals change!"
                    )?;
                    writeln!(self.output, "🚀 Happy investing and wise managing! Goodbye!")?;
                    return Ok(SessionEnd::Finished);
                }
                None => return Ok(SessionEnd::EndOfInput),
            }
        }
    }

    /// Write `text` and read one line; `None` at end of input
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }

    fn ask_salary(&mut self) -> Result<Option<f64>> {
        loop {
            let Some(answer) = self.prompt("📈 Enter your monthly salary amount: $")? else {
                return Ok(None);
            };
            match answer.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v > 0.0 => return Ok(Some(v)),
                Ok(_) => writeln!(self.output, "❌ Please enter a positive number.")?,
                Err(_) => writeln!(self.output, "❌ Invalid input. Please enter numbers only.")?,
            }
        }
    }

    fn ask_choice(&mut self) -> Result<Option<u8>> {
        loop {
            let Some(answer) =
                self.prompt("\nWould you like to:\n1. Use recommendation\n2. Custom percentage\nChoose (1/2): ")?
            else {
                return Ok(None);
            };
            match answer.trim() {
                "1" => return Ok(Some(1)),
                "2" => return Ok(Some(2)),
                _ => writeln!(self.output, "❌ Please enter 1 or 2")?,
            }
        }
    }

    fn ask_percentage(&mut self) -> Result<Option<f64>> {
        loop {
            let Some(answer) = self.prompt("Enter desired investment percentage (0-100): ")? else {
                return Ok(None);
            };
            match answer.trim().parse::<f64>() {
                Ok(v) if (0.0..=100.0).contains(&v) => return Ok(Some(v)),
                Ok(_) => writeln!(self.output, "❌ Percentage must be between 0 and 100")?,
                Err(_) => writeln!(self.output, "❌ Invalid input. Please enter numbers only.")?,
            }
        }
    }

    fn show(&mut self, allocation: &Allocation, custom: bool) -> Result<()> {
        writeln!(self.output, "\n📊 Allocation Results:")?;
        writeln!(self.output, "Salary: {}", format_currency(allocation.salary()))?;
        writeln!(
            self.output,
            "Investing ({}%): {}",
            percent_label(allocation.percent(), custom),
            format_currency(allocation.invest())
        )?;
        writeln!(
            self.output,
            "Management ({}%): {}",
            percent_label(100.0 - allocation.percent(), custom),
            format_currency(allocation.manage())
        )?;
        Ok(())
    }
}

/// Recommended shares are whole numbers and print as such (`15`); typed
/// shares keep a decimal (`10.0`, `12.5`).
fn percent_label(value: f64, custom: bool) -> String {
    if custom && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_whole_percent_keeps_one_decimal() {
        assert_eq!(percent_label(10.0, true), "10.0");
        assert_eq!(percent_label(12.5, true), "12.5");
        assert_eq!(percent_label(15.0, false), "15");
    }
}
