use std::{
    process,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use loopunit::{cli::Opts, writer::Coloring, Harness, Suite, Test, Topology, Verdict};

fn opts() -> Opts {
    Opts { color: Coloring::Never, labels: true, ..Opts::default() }
}

fn main() {
    let main_thread = thread::current().id();
    let hook_calls = Arc::new(AtomicUsize::new(0));

    let suite = Suite::new("harness")
        .with_suite(
            Suite::new("main_thread")
                .with_test(Test::new("dispatches_to_caller", move |cx| {
                    assert_ne!(thread::current().id(), main_thread);
                    let there = cx.on_main_thread(|_| thread::current().id())?;
                    assert_eq!(there, main_thread);
                    Ok(())
                }))
                .with_test(Test::new("sees_test_name", |cx| {
                    let name = cx.on_main_thread(|ecx| ecx.test_name().to_owned())?;
                    assert_eq!(name, "harness.main_thread.sees_test_name");
                    Ok(())
                }))
                .with_test(Test::new("pending", |_| {
                    Err(Verdict::inconclusive("not implemented yet"))
                })),
        )
        .with_test(Test::new("skipped", |_| panic!("must not run")).ignored("flaky"));

    let outcome = Harness::new(suite)
        .before_shutdown({
            let hook_calls = Arc::clone(&hook_calls);
            move || {
                assert_eq!(thread::current().id(), main_thread);
                _ = hook_calls.fetch_add(1, Ordering::SeqCst);
            }
        })
        .with_cli(opts())
        .run()
        .expect("suite executed");

    assert_eq!(outcome.topology, Topology::Dispatched("work-queue".into()));
    assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
    let counts = outcome.result.as_ref().expect("result").counts;
    assert_eq!(counts.passed, 2);
    assert_eq!(counts.inconclusive, 1);
    assert_eq!(counts.ignored, 1);
    assert_eq!(outcome.exit_code(), 0);

    let failing = Harness::new(
        Suite::new("failing").with_test(Test::new("panics", |_| panic!("boom"))),
    )
    .with_cli(opts())
    .run()
    .expect("suite executed");
    assert_eq!(failing.exit_code(), 1);

    println!("harness: ok");
    process::exit(0);
}
