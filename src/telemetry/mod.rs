pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

fn log_ctx<O: ctx::OpMarker>() -> LogCtx<O> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }

pub fn init() -> LogCtx<ops::init::Init> { log_ctx() }
pub fn extract() -> LogCtx<ops::extract::Extract> { log_ctx() }
pub fn product() -> LogCtx<ops::product::Product> { log_ctx() }
pub fn sweep() -> LogCtx<ops::sweep::Sweep> { log_ctx() }
