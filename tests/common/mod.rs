#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use hostroute::{wrap, Handler, Middleware};

/// Installs a fmt subscriber for the duration of a test so `RUST_LOG`
/// controls dispatch logging.
pub struct TestTracing {
    _guard: tracing::subscriber::DefaultGuard,
}

impl TestTracing {
    pub fn init() -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .finish();
        Self {
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }
}

/// Shared record of the order middleware links ran in.
pub type Log = Arc<Mutex<Vec<i32>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<i32> {
    log.lock().unwrap().clone()
}

/// Middleware that records `n` on the way in, then continues the chain.
pub fn tag(log: &Log, n: i32) -> Middleware {
    let log = Arc::clone(log);
    wrap(move |ctx, next| {
        log.lock().unwrap().push(n);
        next.call(ctx)
    })
}

/// Terminal handler writing a 200 `"OK"` response.
pub fn ok_handler() -> Handler {
    Handler::new(|ctx| {
        ctx.response.status = 200;
        ctx.response.write_str("OK");
        Ok(())
    })
}

/// Terminal handler writing an arbitrary body.
pub fn body_handler(body: &'static str) -> Handler {
    Handler::new(move |ctx| {
        ctx.response.status = 200;
        ctx.response.write_str(body);
        Ok(())
    })
}
