//! In-process graph renderer
//!
//! Pulls one stereo frame at a time through the graph in topological order.
//! The clock is the number of rendered frames divided by the sample rate.

use std::collections::VecDeque;

use super::{
    AudioGraph, AudioParam, Convolver, Frame, GraphError, ImpulseResponse, NodeId, Oscillator,
    Param, ParamRef, Target, Waveform,
};

/// How often parameter timelines drop stale events, in frames
const PRUNE_INTERVAL: u64 = 4096;

enum Node {
    Oscillator {
        osc: Oscillator,
        frequency: AudioParam,
        start_at: Option<f64>,
        stop_at: Option<f64>,
    },
    Gain {
        gain: AudioParam,
    },
    Convolver(Box<Convolver>),
    Destination,
}

impl Node {
    fn param(&self, param: Param) -> Option<&AudioParam> {
        match (self, param) {
            (Node::Oscillator { frequency, .. }, Param::Frequency) => Some(frequency),
            (Node::Gain { gain }, Param::Gain) => Some(gain),
            _ => None,
        }
    }

    fn param_mut(&mut self, param: Param) -> Option<&mut AudioParam> {
        match (self, param) {
            (Node::Oscillator { frequency, .. }, Param::Frequency) => Some(frequency),
            (Node::Gain { gain }, Param::Gain) => Some(gain),
            _ => None,
        }
    }

    fn accepts_input(&self) -> bool {
        !matches!(self, Node::Oscillator { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Edge {
    from: NodeId,
    to: Target,
}

/// One node's work for a frame: where its input and modulation come from
struct Step {
    node: usize,
    inputs: Vec<usize>,
    modulators: Vec<usize>,
}

/// Audio graph that renders in-process, one frame at a time
pub struct RenderGraph {
    sample_rate: f64,
    partition: usize,
    frames: u64,
    nodes: Vec<Option<Node>>,
    outputs: Vec<Frame>,
    /// Released slots, reused by the next created node
    free: Vec<usize>,
    edges: Vec<Edge>,
    plan: Vec<Step>,
    dirty: bool,
    mutations: u64,
    destination: NodeId,
}

impl RenderGraph {
    /// Create an empty graph with only a destination node.
    ///
    /// `partition` is the block size convolvers are built with.
    pub fn new(sample_rate: f64, partition: usize) -> Self {
        Self {
            sample_rate,
            partition,
            frames: 0,
            nodes: vec![Some(Node::Destination)],
            outputs: vec![[0.0; 2]],
            free: Vec::new(),
            edges: Vec::new(),
            plan: Vec::new(),
            dirty: true,
            mutations: 0,
            destination: NodeId(0),
        }
    }

    /// Number of live nodes, destination included
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Number of node slots, live or free
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live connections
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of mutating calls that have succeeded so far
    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    /// Number of frames rendered so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Whether `from` is connected to `to`
    pub fn is_connected(&self, from: NodeId, to: Target) -> bool {
        self.edges.contains(&Edge { from, to })
    }

    /// Render one frame and advance the clock
    pub fn render_frame(&mut self) -> Frame {
        if self.dirty {
            self.rebuild_plan();
        }

        let t = self.now();
        for step in &self.plan {
            let mut input = [0.0; 2];
            for &src in &step.inputs {
                input[0] += self.outputs[src][0];
                input[1] += self.outputs[src][1];
            }
            let modulation: f64 = step
                .modulators
                .iter()
                .map(|&src| (self.outputs[src][0] + self.outputs[src][1]) * 0.5)
                .sum();

            let out = match self.nodes[step.node].as_mut() {
                Some(Node::Oscillator {
                    osc,
                    frequency,
                    start_at,
                    stop_at,
                }) => {
                    let started = start_at.is_some_and(|s| s <= t);
                    let stopped = stop_at.is_some_and(|s| s <= t);
                    if started && !stopped {
                        let s = osc.next(frequency.value_at(t) + modulation);
                        [s, s]
                    } else {
                        [0.0; 2]
                    }
                }
                Some(Node::Gain { gain }) => {
                    let g = gain.value_at(t) + modulation;
                    [input[0] * g, input[1] * g]
                }
                Some(Node::Convolver(conv)) => conv.process((input[0] + input[1]) * 0.5),
                Some(Node::Destination) => input,
                None => [0.0; 2],
            };
            self.outputs[step.node] = out;
        }

        self.frames += 1;
        if self.frames % PRUNE_INTERVAL == 0 {
            self.prune();
        }

        self.outputs[self.destination.0]
    }

    /// Render `count` frames, discarding them
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            self.render_frame();
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(GraphError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(GraphError::UnknownNode(id))
    }

    fn param_mut(&mut self, param: ParamRef) -> Result<&mut AudioParam, GraphError> {
        self.node_mut(param.node)?
            .param_mut(param.param)
            .ok_or(GraphError::InvalidParam {
                node: param.node,
                param: param.param,
            })
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                self.outputs[slot] = [0.0; 2];
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.outputs.push([0.0; 2]);
                self.nodes.len() - 1
            }
        };
        self.dirty = true;
        self.mutations += 1;
        NodeId(slot)
    }

    fn check_time(at: f64) -> Result<(), GraphError> {
        if at.is_finite() && at >= 0.0 {
            Ok(())
        } else {
            Err(GraphError::InvalidTime(at))
        }
    }

    /// Topological order over live nodes, or `None` if the edges form a cycle
    fn topological_order(&self) -> Option<Vec<usize>> {
        let mut indegree = vec![0usize; self.nodes.len()];
        for edge in &self.edges {
            indegree[edge.to.node().0] += 1;
        }

        let mut ready: VecDeque<usize> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].is_some() && indegree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(i) = ready.pop_front() {
            order.push(i);
            for edge in self.edges.iter().filter(|e| e.from.0 == i) {
                let to = edge.to.node().0;
                indegree[to] -= 1;
                if indegree[to] == 0 {
                    ready.push_back(to);
                }
            }
        }

        (order.len() == self.node_count()).then_some(order)
    }

    fn rebuild_plan(&mut self) {
        let order = self.topological_order().unwrap_or_default();
        self.plan = order
            .into_iter()
            .map(|node| {
                let mut inputs = Vec::new();
                let mut modulators = Vec::new();
                for edge in self.edges.iter().filter(|e| e.to.node().0 == node) {
                    match edge.to {
                        Target::Node(_) => inputs.push(edge.from.0),
                        Target::Param(_) => modulators.push(edge.from.0),
                    }
                }
                Step {
                    node,
                    inputs,
                    modulators,
                }
            })
            .collect();
        self.dirty = false;
    }

    fn prune(&mut self) {
        let now = self.now();
        for node in self.nodes.iter_mut().flatten() {
            match node {
                Node::Oscillator { frequency, .. } => frequency.prune(now),
                Node::Gain { gain } => gain.prune(now),
                _ => {}
            }
        }
    }
}

impl AudioGraph for RenderGraph {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn now(&self) -> f64 {
        self.frames as f64 / self.sample_rate
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn create_oscillator(
        &mut self,
        waveform: Waveform,
        frequency: f64,
    ) -> Result<NodeId, GraphError> {
        Ok(self.insert(Node::Oscillator {
            osc: Oscillator::new(waveform, self.sample_rate),
            frequency: AudioParam::new(frequency),
            start_at: None,
            stop_at: None,
        }))
    }

    fn create_gain(&mut self, gain: f64) -> Result<NodeId, GraphError> {
        Ok(self.insert(Node::Gain {
            gain: AudioParam::new(gain),
        }))
    }

    fn create_convolver(&mut self, impulse: &ImpulseResponse) -> Result<NodeId, GraphError> {
        let conv = Convolver::new(impulse, self.partition)?;
        Ok(self.insert(Node::Convolver(Box::new(conv))))
    }

    fn connect(&mut self, from: NodeId, to: Target) -> Result<(), GraphError> {
        self.node(from)?;
        let target = self.node(to.node())?;
        match to {
            Target::Node(node) if !target.accepts_input() => {
                return Err(GraphError::NoInput(node));
            }
            Target::Param(param) if target.param(param.param).is_none() => {
                return Err(GraphError::InvalidParam {
                    node: param.node,
                    param: param.param,
                });
            }
            _ => {}
        }

        let edge = Edge { from, to };
        if self.edges.contains(&edge) {
            return Ok(());
        }
        self.edges.push(edge);
        if self.topological_order().is_none() {
            self.edges.pop();
            return Err(GraphError::Cycle {
                from,
                to: to.node(),
            });
        }

        self.dirty = true;
        self.mutations += 1;
        Ok(())
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.node(node)?;
        self.edges.retain(|e| e.from != node);
        self.dirty = true;
        self.mutations += 1;
        Ok(())
    }

    fn start(&mut self, node: NodeId, at: f64) -> Result<(), GraphError> {
        Self::check_time(at)?;
        match self.node_mut(node)? {
            Node::Oscillator { start_at, .. } => {
                *start_at = Some(at);
            }
            _ => {
                return Err(GraphError::InvalidParam {
                    node,
                    param: Param::Frequency,
                })
            }
        }
        self.mutations += 1;
        Ok(())
    }

    fn stop(&mut self, node: NodeId, at: f64) -> Result<(), GraphError> {
        Self::check_time(at)?;
        match self.node_mut(node)? {
            Node::Oscillator { stop_at, .. } => {
                *stop_at = Some(at);
            }
            _ => {
                return Err(GraphError::InvalidParam {
                    node,
                    param: Param::Frequency,
                })
            }
        }
        self.mutations += 1;
        Ok(())
    }

    fn set_value_at_time(
        &mut self,
        param: ParamRef,
        value: f64,
        at: f64,
    ) -> Result<(), GraphError> {
        Self::check_time(at)?;
        self.param_mut(param)?.set_value_at_time(value, at);
        self.mutations += 1;
        Ok(())
    }

    fn exponential_ramp(
        &mut self,
        param: ParamRef,
        target: f64,
        from: f64,
        until: f64,
    ) -> Result<(), GraphError> {
        if !target.is_finite() || target <= 0.0 {
            return Err(GraphError::InvalidRampTarget(target));
        }
        Self::check_time(from)?;
        Self::check_time(until)?;
        if until <= from {
            return Err(GraphError::InvalidTime(until));
        }
        self.param_mut(param)?.exponential_ramp(target, from, until);
        self.mutations += 1;
        Ok(())
    }

    fn param_value(&self, param: ParamRef) -> Result<f64, GraphError> {
        let value = self
            .node(param.node)?
            .param(param.param)
            .ok_or(GraphError::InvalidParam {
                node: param.node,
                param: param.param,
            })?
            .value_at(self.now());
        Ok(value)
    }

    fn release(&mut self, node: NodeId) -> Result<(), GraphError> {
        if node == self.destination {
            return Err(GraphError::NoInput(node));
        }
        self.node(node)?;
        self.edges.retain(|e| e.from != node && e.to.node() != node);
        self.nodes[node.0] = None;
        self.outputs[node.0] = [0.0; 2];
        self.free.push(node.0);
        self.dirty = true;
        self.mutations += 1;
        Ok(())
    }
}
