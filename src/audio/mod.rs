mod clip;
mod player;
mod recorder;
mod session;

pub use clip::AudioClip;
pub(crate) use clip::render_wav;
pub use player::AudioPlayer;
pub use recorder::Recorder;
pub use session::{CaptureSession, SessionEnd, SessionLimits};
