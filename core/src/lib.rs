pub mod drill;
pub mod error;
pub mod generator;
pub mod history;
pub mod operation;
pub mod problem;
pub mod sound;
pub mod store;
pub mod timecalc;

pub use drill::{Drill, DrillHistory, DrillSummary};
pub use error::{AudioError, HistoryError, InputError, StoreError, TimeError};
pub use generator::{parse_answer, Generator};
pub use history::{HistoryManager, HistoryPolicy, HistoryStatistics, SaveOutcome, SessionRecord};
pub use operation::{Operation, QUESTIONS_PER_SET};
pub use problem::Problem;
pub use sound::{AudioBackend, NoopBackend, SoundCue, SoundManager};
pub use store::{FileStore, KeyValueStore, MemoryStore};
