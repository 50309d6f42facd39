/*! thread pools running one job per connection */
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};

use crate::Result;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// thread pool trait
pub trait ThreadPool: Sized {
    /// start a pool with `threads` workers
    fn new(threads: u32) -> Result<Self>;

    /// run `job` on some worker; a panicking job must not shrink the pool
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static;
}

/// fixed set of workers pulling jobs from one shared channel
pub struct SharedQueueThreadPool {
    sender: Sender<Job>,
}

#[derive(Clone)]
struct Worker {
    receiver: Receiver<Job>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        if thread::panicking() {
            log::warn!("a job panicked, replacing its worker");
            let worker = self.clone();
            if let Err(e) = thread::Builder::new().spawn(move || worker.run()) {
                log::error!("failed to respawn worker: {}", e);
            }
        }
    }
}

impl Worker {
    fn run(self) {
        for job in self.receiver.iter() {
            job()
        }
    }
}

impl ThreadPool for SharedQueueThreadPool {
    fn new(threads: u32) -> Result<Self> {
        let (sender, receiver) = channel::unbounded::<Job>();

        for _ in 0..threads {
            let worker = Worker {
                receiver: receiver.clone(),
            };
            thread::Builder::new().spawn(move || worker.run())?;
        }

        Ok(Self { sender })
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sender.send(Box::new(job)).is_err() {
            log::error!("no worker left in thread pool, job dropped");
        }
    }
}

/// a thread pool based on rayon
pub struct RayonThreadPool {
    pool: rayon::ThreadPool,
}

impl ThreadPool for RayonThreadPool {
    fn new(threads: u32) -> Result<Self> {
        Ok(Self {
            pool: rayon::ThreadPoolBuilder::new()
                .num_threads(threads as usize)
                .panic_handler(|_| log::warn!("a job panicked"))
                .build()?,
        })
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(job)
    }
}
