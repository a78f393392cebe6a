use std::thread;

use http::Method;
use hostroute::{Application, Context, DispatchOutcome};

mod common;
use common::body_handler;

/// Concurrent dispatches racing a writer that flips a domain binding must
/// never error, panic, or observe a half-applied mapping: every single
/// dispatch sees either the bound or the unbound state in full.
#[test]
fn dispatch_races_domain_swap_without_torn_reads() {
    let app = Application::new("race");
    let blog = app.new_module("blog", Vec::new()).unwrap();
    blog.get("/index", body_handler("blog index")).unwrap();

    const ITERS: usize = 500;
    let mut workers = Vec::new();
    for _ in 0..4 {
        let app = app.clone();
        workers.push(thread::spawn(move || {
            for _ in 0..ITERS {
                // Virtual-host form: either the binding is visible (match)
                // or it is not (miss); both are valid serializations.
                let mut ctx = Context::new(Method::GET, "blog.example:80", "/index");
                let outcome = app.dispatch(&mut ctx).unwrap();
                if outcome == DispatchOutcome::Matched {
                    assert_eq!(ctx.response.body_str(), "blog index");
                }

                // Prefix form must be the complement-shaped outcome: it can
                // only match while the module is unbound.
                let mut ctx = Context::new(Method::GET, "example:80", "/blog/index");
                let outcome = app.dispatch(&mut ctx).unwrap();
                if outcome == DispatchOutcome::Matched {
                    assert_eq!(ctx.response.body_str(), "blog index");
                }
            }
        }));
    }

    let writer = {
        let app = app.clone();
        thread::spawn(move || {
            for i in 0..ITERS {
                let domain = if i % 2 == 0 { "blog.example:80" } else { "" };
                app.set_domain("blog", domain).unwrap();
            }
            app.set_domain("blog", "").unwrap();
        })
    };

    for worker in workers {
        worker.join().unwrap();
    }
    writer.join().unwrap();

    // Quiesced end state: writer left the module unbound.
    let mut ctx = Context::new(Method::GET, "example:80", "/blog/index");
    assert_eq!(app.dispatch(&mut ctx).unwrap(), DispatchOutcome::Matched);
    let mut ctx = Context::new(Method::GET, "blog.example:80", "/index");
    assert_eq!(app.dispatch(&mut ctx).unwrap(), DispatchOutcome::NotFound);
}

/// Registration racing matching must not corrupt the route table: matchers
/// keep the snapshot they loaded, and already-registered routes keep
/// resolving throughout.
#[test]
fn registration_races_matching_without_corruption() {
    let app = Application::new("reg-race");
    let base = app.new_module("base", Vec::new()).unwrap();
    base.get("/warm", body_handler("warm")).unwrap();

    let registrar = {
        let app = app.clone();
        thread::spawn(move || {
            let base = app.module("base").unwrap();
            for i in 0..200 {
                base.get(&format!("/late/{i}"), body_handler("late")).unwrap();
            }
        })
    };

    let mut matchers = Vec::new();
    for _ in 0..4 {
        let app = app.clone();
        matchers.push(thread::spawn(move || {
            for _ in 0..500 {
                let mut ctx = Context::new(Method::GET, "localhost", "/warm");
                assert_eq!(app.dispatch(&mut ctx).unwrap(), DispatchOutcome::Matched);
                assert_eq!(ctx.response.body_str(), "warm");
            }
        }));
    }

    registrar.join().unwrap();
    for matcher in matchers {
        matcher.join().unwrap();
    }

    // Everything the registrar added is now reachable.
    let mut ctx = Context::new(Method::GET, "localhost", "/late/199");
    assert_eq!(app.dispatch(&mut ctx).unwrap(), DispatchOutcome::Matched);
}
