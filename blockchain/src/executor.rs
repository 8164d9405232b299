//! The ordered dispatcher: one logical worker draining a serialized
//! queue. Work items of the same subject never execute concurrently, and
//! this is the only mechanism allowed to mutate pool and organizer state.

use std::sync::mpsc::{channel, Sender};
use std::thread;
use parking_lot::Mutex;

enum Task {
	Work(Box<dyn FnOnce() + Send>),
	Stop,
}

pub struct OrderedExecutor {
	sender: Mutex<Sender<Task>>,
	worker: Option<thread::JoinHandle<()>>,
}

impl OrderedExecutor {
	pub fn new(name: &str) -> Self {
		let (sender, receiver) = channel();
		let worker = thread::Builder::new()
			.name(format!("{} worker", name))
			.spawn(move || {
				while let Ok(task) = receiver.recv() {
					match task {
						Task::Work(work) => work(),
						Task::Stop => break,
					}
				}
			})
			.expect("Error creating ordered worker thread");

		OrderedExecutor {
			sender: Mutex::new(sender),
			worker: Some(worker),
		}
	}

	/// Enqueues work behind everything already queued.
	pub fn execute<F>(&self, work: F) where F: FnOnce() + Send + 'static {
		// the worker outlives every sender, failure means shutdown
		let _ = self.sender.lock().send(Task::Work(Box::new(work)));
	}
}

impl Drop for OrderedExecutor {
	fn drop(&mut self) {
		let _ = self.sender.lock().send(Task::Stop);
		if let Some(worker) = self.worker.take() {
			worker.join().expect("Clean shutdown.");
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::mpsc::channel;
	use parking_lot::Mutex;
	use super::OrderedExecutor;

	#[test]
	fn test_executor_preserves_order() {
		let executor = OrderedExecutor::new("test");
		let order = Arc::new(Mutex::new(Vec::new()));
		let (done, finished) = channel();

		for i in 0..100 {
			let order = order.clone();
			let done = done.clone();
			executor.execute(move || {
				order.lock().push(i);
				if i == 99 {
					done.send(()).unwrap();
				}
			});
		}

		finished.recv().unwrap();
		assert_eq!(*order.lock(), (0..100).collect::<Vec<_>>());
	}
}
