//! The graph container, `connect()` validation, and the readiness-driven
//! scheduler (with an optional multi-threaded worker pool).

use std::sync::{Arc, Mutex};

use wirecell_core::{Error, Result};

use crate::node::Node;
use crate::port::check_edge_creatable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A dataflow graph of typed [`Node`]s connected by [`crate::edge::Edge`]s.
pub struct Graph {
    nodes: Vec<Arc<Mutex<Box<dyn Node>>>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn add_node(&mut self, node: Box<dyn Node>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Arc::new(Mutex::new(node)));
        id
    }

    /// Plug a fresh edge from `tail`'s output port `sport` to `head`'s
    /// input port `rport`, rejecting mismatched port types or
    /// out-of-range indices before anything runs.
    pub fn connect(&mut self, tail: NodeId, sport: usize, head: NodeId, rport: usize) -> Result<()> {
        if tail.0 == head.0 {
            return Err(Error::Value("cannot connect a node to itself".into()));
        }
        let tail_arc = self
            .nodes
            .get(tail.0)
            .ok_or_else(|| Error::Index(format!("no such node {}", tail.0)))?
            .clone();
        let head_arc = self
            .nodes
            .get(head.0)
            .ok_or_else(|| Error::Index(format!("no such node {}", head.0)))?
            .clone();

        let mut tail_guard = tail_arc.lock().expect("node poisoned");
        let mut head_guard = head_arc.lock().expect("node poisoned");

        let out_port = tail_guard
            .output_ports()
            .get_mut(sport)
            .ok_or_else(|| Error::Index(format!("tail has no output port {sport}")))?;
        let in_port_type_check = {
            // Borrow head immutably first to build the edge (type check),
            // then plug both mutably.
            let in_ports = head_guard.input_ports();
            let in_port = in_ports
                .get_mut(rport)
                .ok_or_else(|| Error::Index(format!("head has no input port {rport}")))?;
            check_edge_creatable(out_port, in_port)?
        };
        out_port.plug(in_port_type_check.clone());
        head_guard.input_ports()[rport].plug(in_port_type_check);
        Ok(())
    }

    /// Run to completion on the calling thread: each round, call
    /// `work()` on every not-yet-finished node; stop when every node is
    /// finished, and fail if a full round makes no progress (deadlock).
    pub fn run(&mut self) -> Result<()> {
        loop {
            let mut progressed = false;
            let mut all_finished = true;
            for node in &self.nodes {
                let mut guard = node.lock().expect("node poisoned");
                if guard.finished() {
                    continue;
                }
                all_finished = false;
                if guard.work()? {
                    progressed = true;
                }
            }
            if all_finished {
                return Ok(());
            }
            if !progressed {
                return Err(Error::Runtime("deadlock: no node made progress this round".into()));
            }
        }
    }

    /// Run to completion using up to `workers` threads: each round,
    /// every not-yet-finished node is offered to the pool exactly once,
    /// so no two threads ever contend for the same node's lock.
    pub fn run_pool(&mut self, workers: usize) -> Result<()> {
        if workers <= 1 {
            return self.run();
        }

        loop {
            let not_finished: Vec<usize> = self
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| !n.lock().expect("node poisoned").finished())
                .map(|(i, _)| i)
                .collect();
            if not_finished.is_empty() {
                return Ok(());
            }

            let nodes = self.nodes.clone();
            let (work_tx, work_rx) = crossbeam_channel::unbounded::<usize>();
            for i in not_finished {
                work_tx.send(i).expect("work channel open");
            }
            drop(work_tx);

            let (result_tx, result_rx) = crossbeam_channel::unbounded::<Result<bool>>();
            std::thread::scope(|scope| {
                for _ in 0..workers {
                    let work_rx = work_rx.clone();
                    let result_tx = result_tx.clone();
                    let nodes = &nodes;
                    scope.spawn(move || {
                        while let Ok(i) = work_rx.recv() {
                            let mut guard = nodes[i].lock().expect("node poisoned");
                            let _ = result_tx.send(guard.work());
                        }
                    });
                }
            });
            drop(result_tx);

            let mut progressed = false;
            for r in result_rx.try_iter() {
                if r? {
                    progressed = true;
                }
            }
            if !progressed {
                return Err(Error::Runtime("deadlock: no node made progress this round".into()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Shape;
    use crate::port::{InputPort, OutputPort};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;

    struct CountingSource {
        remaining: usize,
        out: [OutputPort; 1],
        eos_sent: bool,
    }

    impl Node for CountingSource {
        fn shape(&self) -> Shape {
            Shape::Source
        }
        fn input_ports(&mut self) -> &mut [InputPort] {
            &mut []
        }
        fn output_ports(&mut self) -> &mut [OutputPort] {
            &mut self.out
        }
        fn work(&mut self) -> Result<bool> {
            if self.remaining > 0 {
                self.remaining -= 1;
                self.out[0].send(self.remaining)?;
                return Ok(true);
            }
            if !self.eos_sent {
                self.out[0].send_eos()?;
                self.eos_sent = true;
                return Ok(true);
            }
            Ok(false)
        }
        fn finished(&self) -> bool {
            self.eos_sent
        }
    }

    struct CountingSink {
        received: StdArc<AtomicUsize>,
        inp: [InputPort; 1],
        done: bool,
    }

    impl Node for CountingSink {
        fn shape(&self) -> Shape {
            Shape::Sink
        }
        fn input_ports(&mut self) -> &mut [InputPort] {
            &mut self.inp
        }
        fn output_ports(&mut self) -> &mut [OutputPort] {
            &mut []
        }
        fn work(&mut self) -> Result<bool> {
            if self.done {
                return Ok(false);
            }
            if !self.inp[0].ready() {
                return Ok(false);
            }
            let msg = self.inp[0].recv()?;
            if msg.is_eos() {
                self.done = true;
            } else {
                self.received.fetch_add(1, Ordering::SeqCst);
            }
            Ok(true)
        }
        fn finished(&self) -> bool {
            self.done
        }
    }

    #[test]
    fn source_to_sink_propagates_eos_and_counts_every_item() {
        let received = StdArc::new(AtomicUsize::new(0));
        let mut graph = Graph::new();
        let src = graph.add_node(Box::new(CountingSource {
            remaining: 5,
            out: [OutputPort::new::<usize>("out")],
            eos_sent: false,
        }));
        let sink = graph.add_node(Box::new(CountingSink {
            received: received.clone(),
            inp: [InputPort::new::<usize>("in")],
            done: false,
        }));
        graph.connect(src, 0, sink, 0).unwrap();
        graph.run().unwrap();
        assert_eq!(received.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn connect_rejects_type_mismatch() {
        let mut graph = Graph::new();
        let src = graph.add_node(Box::new(CountingSource {
            remaining: 1,
            out: [OutputPort::new::<usize>("out")],
            eos_sent: false,
        }));
        struct StringSink {
            inp: [InputPort; 1],
        }
        impl Node for StringSink {
            fn shape(&self) -> Shape {
                Shape::Sink
            }
            fn input_ports(&mut self) -> &mut [InputPort] {
                &mut self.inp
            }
            fn output_ports(&mut self) -> &mut [OutputPort] {
                &mut []
            }
            fn work(&mut self) -> Result<bool> {
                Ok(false)
            }
            fn finished(&self) -> bool {
                true
            }
        }
        let sink = graph.add_node(Box::new(StringSink {
            inp: [InputPort::new::<String>("in")],
        }));
        assert!(graph.connect(src, 0, sink, 0).is_err());
    }

    #[test]
    fn run_pool_matches_sequential_result() {
        let received = StdArc::new(AtomicUsize::new(0));
        let mut graph = Graph::new();
        let src = graph.add_node(Box::new(CountingSource {
            remaining: 20,
            out: [OutputPort::new::<usize>("out")],
            eos_sent: false,
        }));
        let sink = graph.add_node(Box::new(CountingSink {
            received: received.clone(),
            inp: [InputPort::new::<usize>("in")],
            done: false,
        }));
        graph.connect(src, 0, sink, 0).unwrap();
        graph.run_pool(4).unwrap();
        assert_eq!(received.load(Ordering::SeqCst), 20);
    }
}
