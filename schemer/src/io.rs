use std::io::{self, Write};

/// Where the interpreter writes printed results and error reports.
pub trait IoAdapter {
  fn print(&mut self, text: &str) -> io::Result<()>;

  fn println(&mut self, text: &str) -> io::Result<()> {
    self.print(text)?;
    self.print("\n")
  }
}

pub struct StdioAdapter {
  stdout: io::Stdout,
}

impl StdioAdapter {
  pub fn new() -> Self {
    Self {
      stdout: io::stdout(),
    }
  }
}

impl Default for StdioAdapter {
  fn default() -> Self {
    Self::new()
  }
}

impl IoAdapter for StdioAdapter {
  fn print(&mut self, text: &str) -> io::Result<()> {
    let mut handle = self.stdout.lock();
    write!(handle, "{}", text)?;
    handle.flush()
  }
}

/// Collects everything printed; used by tests and benchmarks.
#[derive(Debug, Default)]
pub struct StringIoAdapter {
  output: String,
}

impl StringIoAdapter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn output(&self) -> &str {
    &self.output
  }

  pub fn take_output(&mut self) -> String {
    std::mem::take(&mut self.output)
  }
}

impl IoAdapter for StringIoAdapter {
  fn print(&mut self, text: &str) -> io::Result<()> {
    self.output.push_str(text);
    Ok(())
  }
}
