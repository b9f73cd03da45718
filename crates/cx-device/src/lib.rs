//! `cx-device` — the device driver seam.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`device`]   | `Device` trait, `Level`, `SharedDevice`, `share`, `lock`  |
//! | [`scripted`] | `ScriptedDevice`, `ScriptStep`, `WriteLog` (canned I/O)   |
//! | [`stream`]   | `StreamDevice` — lines from any `BufRead`                 |
//! | [`error`]    | `DeviceError`, `DeviceResult<T>`                          |
//!
//! # Blocking model
//!
//! Every `Device` method may block the calling thread.  Agents never call
//! them on the scheduler thread; they go through
//! `Agent::call_blocking`, which runs the call on the runtime's blocking
//! pool.  That is why a device is shared as `Arc<Mutex<dyn Device>>` even
//! though exactly one agent owns it.

pub mod device;
pub mod error;
pub mod scripted;
pub mod stream;


pub use device::{Device, Level, SharedDevice, lock, share};
pub use error::{DeviceError, DeviceResult};
pub use scripted::{ScriptStep, ScriptedDevice, WriteLog};
pub use stream::StreamDevice;
