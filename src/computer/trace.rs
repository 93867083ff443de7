use std::fmt::Write as _;
use std::io::Write;

use super::{Computer, REGISTER_COUNT};

/// Observer called between fetch and execute.
pub trait Tracer {
    fn trace(&mut self, computer: &Computer);
}

/// Writes one line per instruction: `TRACE: PC | M M M | R0 .. R7`.
pub struct HexTracer<W: Write> {
    sink: W,
}

impl<W: Write> HexTracer<W> {
    pub fn new(sink: W) -> HexTracer<W> {
        HexTracer { sink }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

pub fn format_state(computer: &Computer) -> String {
    let pc = computer.pc();
    let peek = |offset: usize| computer.ram_read(pc + offset).unwrap_or(0);

    let mut line = format!(
        "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
        pc,
        peek(0),
        peek(1),
        peek(2)
    );

    for index in 0..REGISTER_COUNT as u8 {
        let _ = write!(line, " {:02X}", computer.register(index).unwrap_or(0));
    }

    line
}

impl<W: Write> Tracer for HexTracer<W> {
    fn trace(&mut self, computer: &Computer) {
        if let Err(err) = writeln!(self.sink, "{}", format_state(computer)) {
            log::warn!("trace output failed: {err}");
        }
    }
}
