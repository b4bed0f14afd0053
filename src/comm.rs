//! Process-group communication.
//!
//! A [`Communicator`] moves type-erased packets between the ranks of a process group. The
//! typed collectives used by the rest of the crate live on [`ProcessContext`], which builds
//! them on top of the single personalized [`Communicator::exchange`] primitive.
use crate::context::ProcessContext;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};

pub type Packet = Box<dyn Any + Send>;

/// A group of cooperating processes addressed by rank.
///
/// Every method except [`rank`](Self::rank) and [`size`](Self::size) is collective: all ranks
/// must call it, in the same order, and it blocks until the exchange completes.
pub trait Communicator: Send + Sync {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Personalized all-to-all exchange.
    ///
    /// `outgoing[p]` is delivered to rank `p`. The returned vector holds one packet per source
    /// rank, in rank order.
    fn exchange(&self, outgoing: Vec<Packet>) -> Vec<Packet>;

    /// Terminates the whole process group.
    fn abort(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}

/// The trivial single-process group.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialCommunicator;

impl Communicator for SerialCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn exchange(&self, outgoing: Vec<Packet>) -> Vec<Packet> {
        assert_eq!(outgoing.len(), 1, "serial exchange takes exactly one packet");
        outgoing
    }
}

enum Message {
    Data { source: usize, packet: Packet },
    Abort { source: usize },
    Closed { source: usize },
}

struct Channels {
    senders: Vec<Sender<Message>>,
    receiver: Receiver<Message>,
    pending: Vec<VecDeque<Packet>>,
    closed: Vec<bool>,
}

/// A process group made of threads in the current process, connected by channels.
///
/// Mostly useful for exercising multi-rank code paths in tests. A rank that panics, aborts or
/// leaves the group notifies its peers, which then panic instead of blocking forever when a
/// collective still needs that rank.
pub struct ThreadCommunicator {
    rank: usize,
    size: usize,
    channels: Mutex<Channels>,
}

impl ThreadCommunicator {
    /// Creates `n_procs` connected communicators, one per rank.
    pub fn create_group(n_procs: usize) -> Vec<ThreadCommunicator> {
        assert!(n_procs > 0, "a process group needs at least one rank");
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..n_procs).map(|_| channel()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| ThreadCommunicator {
                rank,
                size: n_procs,
                channels: Mutex::new(Channels {
                    senders: senders.clone(),
                    receiver,
                    pending: (0..n_procs).map(|_| VecDeque::new()).collect(),
                    closed: vec![false; n_procs],
                }),
            })
            .collect()
    }

    fn notify_peers(&self, message: impl Fn() -> Message) {
        let channels = self.channels.lock();
        for (rank, sender) in channels.senders.iter().enumerate() {
            if rank != self.rank {
                // Peers that already finished have dropped their receivers.
                let _ = sender.send(message());
            }
        }
    }
}

impl Communicator for ThreadCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn exchange(&self, outgoing: Vec<Packet>) -> Vec<Packet> {
        assert_eq!(outgoing.len(), self.size, "exchange takes one packet per rank");
        let mut channels = self.channels.lock();
        for (dest, packet) in outgoing.into_iter().enumerate() {
            let message = Message::Data {
                source: self.rank,
                packet,
            };
            if channels.senders[dest].send(message).is_err() {
                panic!("rank {} could not reach rank {dest}", self.rank);
            }
        }

        let mut incoming = Vec::with_capacity(self.size);
        for source in 0..self.size {
            while channels.pending[source].is_empty() {
                if channels.closed[source] {
                    panic!("rank {source} left the process group during a collective");
                }
                match channels.receiver.recv() {
                    Ok(Message::Data { source: from, packet }) => channels.pending[from].push_back(packet),
                    Ok(Message::Abort { source: from }) => panic!("rank {from} aborted the process group"),
                    Ok(Message::Closed { source: from }) => channels.closed[from] = true,
                    Err(_) => panic!("process group disconnected"),
                }
            }
            if let Some(packet) = channels.pending[source].pop_front() {
                incoming.push(packet);
            }
        }
        incoming
    }

    fn abort(&self, code: i32) -> ! {
        self.notify_peers(|| Message::Abort { source: self.rank });
        panic!("rank {} aborted with code {code}", self.rank)
    }
}

impl Drop for ThreadCommunicator {
    fn drop(&mut self) {
        let source = self.rank;
        if std::thread::panicking() {
            self.notify_peers(|| Message::Abort { source });
        } else {
            self.notify_peers(|| Message::Closed { source });
        }
    }
}

/// Runs `f` on `n_procs` ranks, each on its own thread with a [`ThreadCommunicator`].
///
/// Returns the per-rank results in rank order. A panic on any rank is propagated.
pub fn run_threaded<R, F>(n_procs: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(&ProcessContext) -> R + Sync,
{
    let comms = ThreadCommunicator::create_group(n_procs);
    std::thread::scope(|scope| {
        let f = &f;
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                scope.spawn(move || {
                    let ctx = ProcessContext::new(Box::new(comm));
                    f(&ctx)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(payload) => std::panic::resume_unwind(payload),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::time::Duration;

    #[test]
    fn collectives_combine_every_rank() {
        let sums = run_threaded(3, |ctx| ctx.all_reduce_sum(ctx.rank() + 1));
        assert_eq!(sums, vec![6, 6, 6]);
    }

    #[test]
    fn early_finishers_do_not_disturb_the_last_collective() {
        for _ in 0..20 {
            let results = run_threaded(4, |ctx| {
                let mut total = 0;
                for round in 0..5 {
                    total += ctx.all_reduce_sum(round * ctx.rank());
                }
                total
            });
            assert_eq!(results, vec![60; 4]);
        }
    }

    #[test]
    fn rank_returning_an_error_ends_the_group() {
        for delay in [0, 50] {
            let result = catch_unwind(AssertUnwindSafe(|| {
                run_threaded(2, |ctx| -> Result<usize, String> {
                    if ctx.rank() == 0 {
                        // Give rank 1 time to block inside the collective
                        std::thread::sleep(Duration::from_millis(delay));
                        return Err("mesh file not found".to_string());
                    }
                    Ok(ctx.all_reduce_sum(1usize))
                })
            }));
            assert!(result.is_err());
        }
    }
}
