use crate::common::Debug;

/// Line-oriented sink for interpreter diagnostics. `line_writer` is called
/// once per logged line; returning `None` discards the line.
pub trait Logger: Debug {
    fn line_writer(&mut self) -> Option<&mut dyn std::io::Write>;
    fn dump_log(&self, w: &mut dyn std::io::Write);
}

#[derive(Debug)]
pub struct DummyLogger;

/// Keeps every line in memory, so the host can inspect it with `dump_log`.
#[derive(Debug)]
pub struct VecLogger(&'static str, Vec<u8>);

#[derive(Debug)]
pub struct FileLogger(&'static str, std::fs::File);

fn secs_since_unix_epoch() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|dur| dur.as_secs_f64())
        .unwrap_or(0.)
}
impl FileLogger {
    pub fn new(session: &'static str, file: std::fs::File) -> Self {
        Self(session, file)
    }
}
impl VecLogger {
    pub fn new(session: &'static str) -> Self {
        Self(session, Default::default())
    }
    pub fn contents(&self) -> &[u8] {
        &self.1
    }
}
/////////////////
impl Logger for DummyLogger {
    fn line_writer(&mut self) -> Option<&mut dyn std::io::Write> {
        None
    }
    fn dump_log(&self, _: &mut dyn std::io::Write) {}
}

impl Logger for VecLogger {
    fn line_writer(&mut self) -> Option<&mut dyn std::io::Write> {
        let _ = std::io::Write::write_fmt(
            &mut self.1,
            format_args!("{} at {:.6} ", self.0, secs_since_unix_epoch()),
        );
        Some(self)
    }
    fn dump_log(&self, w: &mut dyn std::io::Write) {
        let _ = w.write_all(self.1.as_slice());
    }
}
impl Logger for FileLogger {
    fn line_writer(&mut self) -> Option<&mut dyn std::io::Write> {
        let _ = std::io::Write::write_fmt(
            &mut self.1,
            format_args!("{} at {:.6} ", self.0, secs_since_unix_epoch()),
        );
        Some(&mut self.1)
    }
    fn dump_log(&self, _: &mut dyn std::io::Write) {}
}
///////////////////
impl std::io::Write for VecLogger {
    fn flush(&mut self) -> Result<(), std::io::Error> {
        Ok(())
    }
    fn write(&mut self, data: &[u8]) -> Result<usize, std::io::Error> {
        self.1.extend_from_slice(data);
        Ok(data.len())
    }
}
