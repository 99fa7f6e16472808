use spark_propagate::{
    cloned, create_propagation, create_propagation_with, Delivery, PropagationConfig,
    PropagationScope, RenderPhase,
};
use std::cell::{Cell, RefCell};
use std::io::Write;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

// =============================================================================
// LOG CAPTURE
// =============================================================================

#[derive(Clone)]
struct BufferWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl BufferWriter {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn into_string(&self) -> String {
        let bytes = self.inner.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for BufferWriter {
    type Writer = BufferGuard;

    fn make_writer(&'a self) -> Self::Writer {
        BufferGuard {
            inner: self.inner.clone(),
        }
    }
}

struct BufferGuard {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl Write for BufferGuard {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` and return the warning lines it logged, message first.
fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    use tracing::subscriber::with_default;
    use tracing_subscriber::EnvFilter;

    let writer = BufferWriter::new();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_level(false)
        .with_writer(writer.clone())
        .finish();

    let result = with_default(subscriber, f);

    let lines = writer
        .into_string()
        .lines()
        .map(str::to_owned)
        .collect();
    (result, lines)
}

fn is_propagate_warning(line: &str) -> bool {
    line.trim_start()
        .strip_prefix("use-propagate:")
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

// =============================================================================
// GUARDED BROADCAST
// =============================================================================

#[test]
fn broadcast_while_computing_warns_once_and_delivers_nothing() {
    let scope = PropagationScope::new();
    let l1 = Rc::new(Cell::new(0));
    let l2 = Rc::new(Cell::new(0));
    let _s1 = scope.subscribe(cloned!(l1 => move |_: &i32| l1.set(l1.get() + 1)));
    let _s2 = scope.subscribe(cloned!(l2 => move |_: &i32| l2.set(l2.get() + 1)));

    scope.on_compute_start();
    let (delivery, warnings) = capture_warnings(|| scope.broadcast(1));

    assert_eq!(delivery, Delivery::Suppressed);
    assert_eq!(l1.get(), 0);
    assert_eq!(l2.get(), 0);
    assert_eq!(warnings.len(), 1, "Exactly one warning: {warnings:?}");
    assert!(is_propagate_warning(&warnings[0]), "Unexpected warning: {}", warnings[0]);

    scope.on_commit();
    let (delivery, warnings) = capture_warnings(|| scope.broadcast(2));

    assert_eq!(delivery, Delivery::Delivered(2));
    assert_eq!((l1.get(), l2.get()), (1, 1));
    assert!(warnings.is_empty());
}

#[test]
fn each_guarded_call_warns_separately() {
    let scope: PropagationScope<i32> = PropagationScope::new();
    let _pass = scope.begin_compute();

    let (_, warnings) = capture_warnings(|| {
        scope.broadcast(1);
        scope.broadcast(2);
        scope.broadcast(3);
    });

    assert_eq!(warnings.len(), 3);
    assert!(warnings.iter().all(|w| is_propagate_warning(w)));
}

#[test]
fn allow_during_render_delivers_without_warning() {
    let scope = PropagationScope::with_config(
        PropagationConfig::default().with_allow_propagate_during_render(true),
    );
    let seen = Rc::new(RefCell::new(Vec::new()));
    let _sub = scope.subscribe(cloned!(seen => move |v: &i32| seen.borrow_mut().push(*v)));

    let (delivery, warnings) = capture_warnings(|| {
        let propagate = scope.acquire_propagator();
        propagate.propagate(123)
    });

    assert_eq!(delivery, Delivery::Delivered(1));
    assert_eq!(*seen.borrow(), vec![123]);
    assert!(warnings.is_empty(), "No warnings expected: {warnings:?}");
}

#[test]
fn empty_scope_still_warns_while_computing() {
    let scope: PropagationScope<()> = PropagationScope::new();
    scope.on_compute_start();

    let (delivery, warnings) = capture_warnings(|| scope.broadcast(()));

    assert!(delivery.is_suppressed());
    assert_eq!(warnings.len(), 1);
}

// =============================================================================
// RENDER CYCLE SIMULATION
// =============================================================================
//
// A "component" acquires its propagator and subscribes during render, then the
// renderer commits. Propagating from within render is dropped; propagating
// from an event handler after commit is delivered.
// =============================================================================

#[test]
fn propagate_during_render_is_ignored() {
    let propagation = create_propagation::<i32>();
    let scope = propagation.default_scope().unwrap();
    let listener_calls = Rc::new(Cell::new(0));

    let (listen, warnings) = capture_warnings(|| {
        let listen = propagation
            .listen(cloned!(listener_calls => move |_: &i32| listener_calls.set(listener_calls.get() + 1)))
            .unwrap();
        propagation.acquire_propagator().unwrap().propagate(123);
        listen
    });
    scope.on_commit();

    assert_eq!(listener_calls.get(), 0);
    assert_eq!(warnings.len(), 1);
    assert!(is_propagate_warning(&warnings[0]));
    drop(listen);
}

#[test]
fn propagate_from_handler_after_commit_is_delivered() {
    let propagation = create_propagation::<i32>();
    let scope = propagation.scope();
    let count = Rc::new(Cell::new(0));
    let seen = Rc::new(RefCell::new(Vec::new()));

    // Render
    let (propagate, listen) = propagation.provide(&scope, || {
        let propagate = propagation.acquire_propagator().unwrap();
        let listen = propagation
            .listen(cloned!(seen => move |v: &i32| seen.borrow_mut().push(*v)))
            .unwrap();
        (propagate, listen)
    });
    assert_eq!(scope.phase(), RenderPhase::Computing);

    // Commit
    scope.on_commit();

    // Click handler
    let handle_click = cloned!(count, propagate => move || {
        count.set(count.get() + 1);
        propagate.propagate(count.get())
    });

    assert_eq!(handle_click(), Delivery::Delivered(1));
    assert_eq!(handle_click(), Delivery::Delivered(1));
    assert_eq!(*seen.borrow(), vec![1, 2]);

    drop(listen);
}

#[test]
fn render_pass_on_other_scope_does_not_guard() {
    let propagation = create_propagation_with::<i32>(PropagationConfig::strict());
    let rendering = propagation.scope();
    let idle = propagation.scope();
    let hits = Rc::new(Cell::new(0));
    let _sub = idle.subscribe(cloned!(hits => move |_: &i32| hits.set(hits.get() + 1)));

    let _pass = rendering.begin_compute();
    let (delivery, warnings) = capture_warnings(|| idle.broadcast(1));

    assert_eq!(delivery, Delivery::Delivered(1));
    assert_eq!(hits.get(), 1);
    assert!(warnings.is_empty());
}

#[test]
fn commit_inside_compute_pass_leaves_scope_idle() {
    let scope = PropagationScope::new();
    let hits = Rc::new(Cell::new(0));
    let _sub = scope.subscribe(cloned!(hits => move |_: &i32| hits.set(hits.get() + 1)));

    let _propagate = scope.acquire_propagator();
    let pass = scope.begin_compute();
    scope.on_commit();
    drop(pass);

    let (delivery, warnings) = capture_warnings(|| scope.broadcast(1));

    assert_eq!(delivery, Delivery::Delivered(1));
    assert_eq!(hits.get(), 1);
    assert!(warnings.is_empty(), "No warnings expected: {warnings:?}");
}
