//! The per-process context: rank, process count, log sinks and typed collectives.
use crate::comm::{Communicator, Packet, SerialCommunicator};
use crate::config::{LogConfig, LogLevel};
use eyre::WrapErr;
use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::iter::Sum;
use std::time::Instant;

/// Everything a process needs to take part in a distributed run.
///
/// Constructed once at startup and passed by reference to every collective operation.
pub struct ProcessContext {
    comm: Box<dyn Communicator>,
    level: LogLevel,
    log_file: Option<Mutex<LineWriter<File>>>,
}

impl fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessContext")
            .field("rank", &self.rank())
            .field("n_procs", &self.n_procs())
            .field("level", &self.level)
            .finish()
    }
}

fn downcast<T: 'static>(packet: Packet) -> T {
    match packet.downcast::<T>() {
        Ok(value) => *value,
        Err(_) => panic!(
            "collective received a packet of unexpected type (expected {})",
            std::any::type_name::<T>()
        ),
    }
}

impl ProcessContext {
    pub fn new(comm: Box<dyn Communicator>) -> Self {
        Self {
            comm,
            level: LogLevel::default(),
            log_file: None,
        }
    }

    pub fn serial() -> Self {
        Self::new(Box::new(SerialCommunicator))
    }

    /// Creates a context that logs according to `config`, opening the per-process log file.
    pub fn with_log_config(comm: Box<dyn Communicator>, config: &LogConfig) -> eyre::Result<Self> {
        let mut ctx = Self::new(comm);
        ctx.level = config.level;
        if let Some(base) = &config.file {
            let path = format!("{}_{}.log", base.display(), ctx.rank());
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .wrap_err_with(|| format!("failed to open log file {path}"))?;
            ctx.log_file = Some(Mutex::new(LineWriter::new(file)));
        }
        Ok(ctx)
    }

    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    pub fn n_procs(&self) -> usize {
        self.comm.size()
    }

    pub fn is_root(&self) -> bool {
        self.rank() == 0
    }

    pub fn log(&self, level: LogLevel, message: impl fmt::Display) {
        if level < self.level {
            return;
        }
        let line = format!("PROCESS-{}-{}: {}", self.rank(), level.label(), message);
        log::log!(level.to_log_level(), "{line}");
        if let Some(file) = &self.log_file {
            // A failing log sink must not take the run down.
            let _ = writeln!(file.lock(), "{line}");
        }
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(LogLevel::All, message)
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(LogLevel::Error, message)
    }

    /// Logs the error and terminates the whole process group.
    pub fn abort_with(&self, err: &dyn fmt::Display) -> ! {
        self.error(err);
        self.comm.abort(1)
    }

    /// Unwraps `result`, aborting the process group on error.
    pub fn abort_on_error<T, E: fmt::Display>(&self, result: Result<T, E>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => self.abort_with(&err),
        }
    }

    /// Sends `send[p]` to rank `p`, returning the packets received from each rank.
    pub fn all_to_all_v<T: Send + 'static>(&self, send: Vec<Vec<T>>) -> Vec<Vec<T>> {
        assert_eq!(send.len(), self.n_procs(), "one buffer per rank is required");
        let packets = send.into_iter().map(|buf| Box::new(buf) as Packet).collect();
        self.comm.exchange(packets).into_iter().map(downcast).collect()
    }

    /// Sends the single value `send[p]` to rank `p`.
    pub fn all_to_all<T: Send + 'static>(&self, send: Vec<T>) -> Vec<T> {
        assert_eq!(send.len(), self.n_procs(), "one value per rank is required");
        let packets = send.into_iter().map(|value| Box::new(value) as Packet).collect();
        self.comm.exchange(packets).into_iter().map(downcast).collect()
    }

    pub fn all_gather<T: Clone + Send + 'static>(&self, value: T) -> Vec<T> {
        self.all_to_all(vec![value; self.n_procs()])
    }

    pub fn all_reduce_sum<T: Clone + Send + Sum + 'static>(&self, value: T) -> T {
        if self.n_procs() == 1 {
            return value;
        }
        self.all_gather(value).into_iter().sum()
    }

    /// Element-wise sum of equally sized slices across all ranks.
    pub fn all_reduce_sum_slice(&self, values: &[f64]) -> Vec<f64> {
        if self.n_procs() == 1 {
            return values.to_vec();
        }
        let mut total = vec![0.0; values.len()];
        for contribution in self.all_gather(values.to_vec()) {
            assert_eq!(contribution.len(), total.len(), "reduction buffers differ in length");
            for (t, c) in total.iter_mut().zip(contribution) {
                *t += c;
            }
        }
        total
    }

    /// Gathers one buffer from every rank on `root`. Other ranks receive `None`.
    pub fn gather_v<T: Send + 'static>(&self, root: usize, data: Vec<T>) -> Option<Vec<Vec<T>>> {
        let mut send: Vec<Vec<T>> = (0..self.n_procs()).map(|_| Vec::new()).collect();
        send[root] = data;
        let received = self.all_to_all_v(send);
        (self.rank() == root).then_some(received)
    }

    /// Distributes `data[p]` from `root` to rank `p`. `data` is ignored on other ranks.
    pub fn scatter_v<T: Send + 'static>(&self, root: usize, data: Vec<Vec<T>>) -> Vec<T> {
        let send = if self.rank() == root {
            assert_eq!(data.len(), self.n_procs(), "scatter root needs one buffer per rank");
            data
        } else {
            (0..self.n_procs()).map(|_| Vec::new()).collect()
        };
        let mut received = self.all_to_all_v(send);
        std::mem::take(&mut received[root])
    }

    /// Broadcasts the value held by `root`, which must be `Some` there.
    pub fn broadcast<T: Clone + Send + 'static>(&self, root: usize, value: Option<T>) -> T {
        let send = if self.rank() == root {
            vec![value; self.n_procs()]
        } else {
            vec![None; self.n_procs()]
        };
        let mut received: Vec<Option<T>> = self.all_to_all(send);
        match received[root].take() {
            Some(value) => value,
            None => panic!("broadcast root {root} provided no value"),
        }
    }
}

/// Logs the wall time between construction and drop.
pub struct Timer<'a> {
    ctx: &'a ProcessContext,
    name: String,
    start: Instant,
}

impl<'a> Timer<'a> {
    pub fn new(ctx: &'a ProcessContext, name: impl Into<String>) -> Self {
        Self {
            ctx,
            name: name.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        let ms = self.start.elapsed().as_millis();
        self.ctx
            .info(format_args!("{} completed in: {} milliseconds", self.name, ms));
    }
}
