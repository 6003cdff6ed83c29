use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uwucatch::{throw, ALL_EXCEPTIONS};

const WORKERS: i32 = 4;

fn main() {
    let registry = tracing_subscriber::Registry::default().with(
        EnvFilter::builder()
            .with_default_directive(tracing::Level::TRACE.into())
            .from_env()
            .unwrap(),
    );

    let tree_layer = tracing_tree::HierarchicalLayer::new(2)
        .with_targets(true)
        .with_bracketed_fields(true);

    registry.with(tree_layer).init();

    uwucatch::designate_main_thread(uwucatch::ThreadIdentity::current());

    uwucatch::run(|| {
        nested();
        message_update();
        workers();

        if std::env::args().any(|arg| arg == "--uncaught") {
            throw!(2, "meow :3 went uncaught");
        }
    });
}

fn nested() {
    let _span = tracing::info_span!("nested").entered();

    uwucatch::r#try(|| {
        uwucatch::r#try(|| throw!(5, "Third level exception"))
            .catch(5, |exception| {
                tracing::info!(%exception, "inner handler");
                throw!(6, "First level rethrown exception");
            })
            .end();
    })
    .catch(6, |exception| tracing::info!(%exception, "outer handler"))
    .end();
}

fn message_update() {
    let _span = tracing::info_span!("message_update").entered();

    let code = uwucatch::r#try(|| -> i32 { throw!(3, "First exception") })
        .catch(4, |_| unreachable!())
        .catch(ALL_EXCEPTIONS, |exception| exception.code())
        .end();
    tracing::info!(code, "caught by catch-all");
}

fn workers() {
    let _span = tracing::info_span!("workers").entered();

    let handles: Vec<_> = (0..WORKERS)
        .map(|id| {
            uwucatch::thread::spawn(move || {
                if id % 2 == 0 {
                    throw!(50 + id, "Thread {id} uncaught exception");
                }
                id
            })
        })
        .collect();

    for handle in handles {
        match handle.join() {
            Ok(id) => tracing::info!(id, "worker finished"),
            Err(uncaught) => tracing::warn!(code = uncaught.code(), "worker died"),
        }
    }
}
