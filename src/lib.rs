//! Interactive 3D scene-graph session driven by remote commands.
//!
//! A [`session::SceneSession`] owns a scene graph of typed objects, an
//! orbitable camera, transform gizmos, free dragging with axis
//! constraints, CPU ray picking, and asset loading. A hosting transport
//! feeds it JSON commands and pointer input, ticks it once per frame,
//! and drains the outbound event queue; the [`app`] module is one such
//! transport, a desktop shell speaking JSON lines over stdin/stdout.

pub mod app;
pub mod assets;
pub mod config;
pub mod events;
pub mod interact;
pub mod render;
pub mod scene;
pub mod session;
