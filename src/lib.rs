// ncplot-rs: NC program interpretation core - modal machine state, handler
// chain dispatch, and motion interpolation producing tool-path geometry
// plus per-move timing.

pub mod canal;
pub mod config;
pub mod diag;
pub mod handlers;
pub mod node;
pub mod parser;
pub mod path;
pub mod report;
pub mod state;

pub use canal::{Canal, CanalError, Machine};
pub use config::{load_config, ConfigError, MachineConfig};
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use handlers::{CommandHandler, ExecOutput, HandlerChain, MotionHandler, SetupHandler};
pub use node::{CommandNode, ParamError, ParamSet};
pub use parser::{parse_program, ParseError};
pub use path::{CanalResult, MoveKind, Point, ToolPathSegment};
pub use report::{CanalPlot, PlotResponse};
pub use state::{Axis, AxisMap, DistanceMode, MachineState, Modal, MotionMode, Plane, Units};
