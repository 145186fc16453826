//! Distributed CI vectors and a polling task queue
//!
//! Each rank is a worker thread owning a contiguous range of alpha rows of a
//! CI vector. Remote rows are requested through channels; a request is polled
//! with `test()` and tasks only run once all of their requests have arrived.

use crate::civec::Civec;
use crate::determinants::Determinants;
use rayon::prelude::*;
use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::debug;

enum RankMessage {
    Fetch { row: usize, reply: Sender<Vec<f64>> },
    Shutdown,
}

/// Outstanding fetch of one alpha row
pub struct Request {
    row: usize,
    receiver: Receiver<Vec<f64>>,
    data: Option<Vec<f64>>,
}

impl Request {
    pub fn row(&self) -> usize {
        self.row
    }

    /// Non-blocking completion check
    pub fn test(&mut self) -> bool {
        if self.data.is_some() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(data) => {
                self.data = Some(data);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                panic!("rank serving row {} hung up before replying", self.row)
            }
        }
    }

    /// Received row; `None` until `test()` has reported completion
    pub fn data(&self) -> Option<&[f64]> {
        self.data.as_deref()
    }
}

/// CI vector whose alpha rows are spread over rank threads
pub struct DistCivec {
    det: Arc<Determinants>,
    ranges: Vec<Range<usize>>,
    senders: Vec<Sender<RankMessage>>,
    handles: Vec<JoinHandle<()>>,
}

impl DistCivec {
    pub fn from_civec(civec: &Civec, nranks: usize) -> Self {
        let det = civec.det().clone();
        let lena = det.lena();
        let lenb = det.lenb();
        let nranks = nranks.clamp(1, lena.max(1));

        let chunk = lena.div_ceil(nranks);
        let mut ranges = Vec::with_capacity(nranks);
        let mut senders = Vec::with_capacity(nranks);
        let mut handles = Vec::with_capacity(nranks);
        for rank in 0..nranks {
            let start = (rank * chunk).min(lena);
            let end = ((rank + 1) * chunk).min(lena);
            let local = civec.data()[start * lenb..end * lenb].to_vec();
            let (tx, rx) = mpsc::channel::<RankMessage>();
            handles.push(std::thread::spawn(move || serve_rows(rx, local, start, lenb)));
            ranges.push(start..end);
            senders.push(tx);
        }
        debug!("Distributed {} alpha rows over {} ranks", lena, nranks);

        DistCivec {
            det,
            ranges,
            senders,
            handles,
        }
    }

    pub fn det(&self) -> &Arc<Determinants> {
        &self.det
    }

    pub fn nranks(&self) -> usize {
        self.ranges.len()
    }

    pub fn local_range(&self, rank: usize) -> Range<usize> {
        self.ranges[rank].clone()
    }

    pub fn owner(&self, row: usize) -> usize {
        match self.ranges.iter().position(|r| r.contains(&row)) {
            Some(rank) => rank,
            None => panic!("alpha row {} is not owned by any rank", row),
        }
    }

    /// Ask the owning rank for one alpha row without waiting for it
    pub fn get_row(&self, row: usize) -> Request {
        let owner = self.owner(row);
        let (reply, receiver) = mpsc::channel();
        if self.senders[owner]
            .send(RankMessage::Fetch { row, reply })
            .is_err()
        {
            panic!("rank {} is no longer serving rows", owner);
        }
        Request {
            row,
            receiver,
            data: None,
        }
    }
}

impl Drop for DistCivec {
    fn drop(&mut self) {
        for sender in &self.senders {
            let _ = sender.send(RankMessage::Shutdown);
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn serve_rows(rx: Receiver<RankMessage>, local: Vec<f64>, start: usize, lenb: usize) {
    while let Ok(message) = rx.recv() {
        match message {
            RankMessage::Fetch { row, reply } => {
                let offset = (row - start) * lenb;
                let _ = reply.send(local[offset..offset + lenb].to_vec());
            }
            RankMessage::Shutdown => break,
        }
    }
}

/// A task whose inputs arrive asynchronously
pub trait DistTask: Send {
    type Output: Send;

    /// True once every outstanding request has completed
    fn test(&mut self) -> bool;

    fn compute(self) -> Self::Output;
}

/// Queue that runs each task once its requests are complete
pub struct DistQueue<T: DistTask> {
    pending: Vec<(usize, T)>,
    results: Vec<Option<T::Output>>,
}

impl<T: DistTask> DistQueue<T> {
    pub fn new() -> Self {
        DistQueue {
            pending: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Submit a task; returns its position in the output
    pub fn push(&mut self, task: T) -> usize {
        let index = self.results.len();
        self.results.push(None);
        self.pending.push((index, task));
        index
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Poll every pending task and run those that are ready
    pub fn flush(&mut self) -> usize {
        let mut ready = Vec::new();
        let mut waiting = Vec::with_capacity(self.pending.len());
        for (index, mut task) in self.pending.drain(..) {
            if task.test() {
                ready.push((index, task));
            } else {
                waiting.push((index, task));
            }
        }
        self.pending = waiting;

        let done: Vec<(usize, T::Output)> = ready
            .into_par_iter()
            .map(|(index, task)| (index, task.compute()))
            .collect();
        let ndone = done.len();
        for (index, output) in done {
            self.results[index] = Some(output);
        }
        ndone
    }

    /// Poll until every task has run; outputs in submission order
    pub fn finish(mut self) -> Vec<T::Output> {
        while !self.pending.is_empty() {
            if self.flush() == 0 {
                std::thread::yield_now();
            }
        }
        self.results.into_iter().flatten().collect()
    }
}

impl<T: DistTask> Default for DistQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
