// src/canal.rs - per-canal program execution and the multi-canal machine
use thiserror::Error;

use crate::config::{ConfigError, MachineConfig};
use crate::diag::Diagnostics;
use crate::handlers::{CommandHandler, HandlerChain, MotionHandler, SetupHandler};
use crate::node::CommandNode;
use crate::path::{CanalResult, ToolPathSegment};
use crate::state::MachineState;

/// Fatal canal conditions. Everything recoverable goes through
/// [`Diagnostics`] instead; an error here aborts the canal's run and names
/// the offending line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanalError {
    #[error("line {line}: node addressed to canal {found} reached canal {expected}")]
    CanalMismatch { line: u32, expected: usize, found: usize },
    #[error("line {line}: handler produced a segment without a duration")]
    InvalidOutcome { line: u32 },
}

/// One control channel: its own state, its own handler chain, and the
/// accumulating tool path. Canals share nothing, so a machine can run them
/// in parallel.
pub struct Canal {
    name: String,
    index: usize,
    state: MachineState,
    chain: HandlerChain,
    segments: Vec<ToolPathSegment>,
    duration: f64,
    diagnostics: Diagnostics,
}

impl Canal {
    pub fn new(name: impl Into<String>, index: usize, state: MachineState, chain: HandlerChain) -> Self {
        Self {
            name: name.into(),
            index,
            state,
            chain,
            segments: Vec::new(),
            duration: 0.0,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Feed a program through the chain strictly in order; later nodes
    /// depend on state committed by earlier ones.
    pub fn run(&mut self, nodes: Vec<CommandNode>) -> Result<(), CanalError> {
        for mut node in nodes {
            if node.canal != self.index {
                return Err(CanalError::CanalMismatch {
                    line: node.line,
                    expected: self.index,
                    found: node.canal,
                });
            }
            tracing::debug!(canal = %self.name, line = node.line, "dispatch {node}");
            let output = self.chain.dispatch(&mut node, &mut self.state, &mut self.diagnostics)?;
            if output.segment.is_some() && output.duration.is_none() {
                return Err(CanalError::InvalidOutcome { line: node.line });
            }
            if let Some(segment) = output.segment {
                self.segments.push(segment);
            }
            if let Some(duration) = output.duration {
                self.duration += duration;
            }
        }
        Ok(())
    }

    pub fn into_result(self) -> CanalResult {
        CanalResult {
            name: self.name,
            segments: self.segments,
            duration: self.duration,
            variables: self.state.variables(),
            diagnostics: self.diagnostics.into_entries(),
        }
    }
}

/// The configured set of canals. Built once from the machine topology;
/// each canal gets the handler sequence its config names.
pub struct Machine {
    canals: Vec<Canal>,
}

impl Machine {
    pub fn from_config(config: &MachineConfig) -> Result<Self, ConfigError> {
        if config.canals.is_empty() {
            return Err(ConfigError::NoCanals);
        }
        config.validate()?;
        let mut canals = Vec::with_capacity(config.canals.len());
        for (index, canal_cfg) in config.canals.iter().enumerate() {
            let mut links: Vec<Box<dyn CommandHandler>> = Vec::with_capacity(canal_cfg.handlers.len());
            for handler in &canal_cfg.handlers {
                match handler.as_str() {
                    "setup" => links.push(Box::new(SetupHandler::new(
                        config.reference_position()?,
                        config.feed.rapid_rate,
                    ))),
                    "motion" => links.push(Box::new(MotionHandler::new(
                        config.interpolation.max_segment,
                        config.feed.default_feed,
                        config.feed.rapid_rate,
                    ))),
                    other => {
                        return Err(ConfigError::UnknownHandler {
                            canal: canal_cfg.name.clone(),
                            handler: other.to_string(),
                        });
                    }
                }
            }
            canals.push(Canal::new(
                canal_cfg.name.clone(),
                index,
                MachineState::new(),
                HandlerChain::new(links),
            ));
        }
        Ok(Self { canals })
    }

    pub fn canal_count(&self) -> usize {
        self.canals.len()
    }

    /// Run one program per canal, one thread per canal. Canals own their
    /// state outright, so no coordination is needed beyond collecting the
    /// results in canal order.
    pub fn run_programs(self, mut programs: Vec<Vec<CommandNode>>) -> Vec<Result<CanalResult, CanalError>> {
        let canals = self.canals;
        if programs.len() > canals.len() {
            tracing::warn!(
                "{} program(s) given for {} canal(s); extra programs ignored",
                programs.len(),
                canals.len()
            );
            programs.truncate(canals.len());
        }
        programs.resize_with(canals.len(), Vec::new);

        std::thread::scope(|scope| {
            let handles: Vec<_> = canals
                .into_iter()
                .zip(programs)
                .map(|(mut canal, nodes)| {
                    scope.spawn(move || canal.run(nodes).map(|()| canal.into_result()))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("canal thread panicked"))
                .collect()
        })
    }
}
