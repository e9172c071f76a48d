mod delay;
mod generator;

pub use self::delay::{Delay, DelayOperation};
pub use self::generator::{
    BatchOutcome, Generator, GeneratorError, GeneratorOperation, GeneratorOutput, GeneratorResult,
};

// Built-in Crux capabilities used as-is: Render drives view updates, Http
// backs the region lookup, KeyValue is the durable cache.
pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

// The Effect derive names each variant after the capability type as written in
// the struct, so `kv` must be spelled `Kv` to produce `Effect::Kv`.
use crux_kv::KeyValue as Kv;

use crate::event::Event;

pub type AppRender = Render<Event>;
pub type AppGenerator = Generator<Event>;
pub type AppKv = KeyValue<Event>;
pub type AppHttp = Http<Event>;
pub type AppDelay = Delay<Event>;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub generator: Generator<Event>,
    pub kv: Kv<Event>,
    pub http: Http<Event>,
    pub delay: Delay<Event>,
}
