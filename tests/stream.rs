use std::{
    io::{BufRead as _, BufReader, Write as _},
    net::{Ipv4Addr, TcpListener},
    thread,
};

use loopunit::{
    event::Kind,
    writer::{Stream, TcpWriter},
    Listener, Orchestrator, Registry, ResultState, Suite, Test, TestInfo,
    TestResult, Verdict,
};

/// Accepts a single connection and collects every line received on it until
/// the peer closes it.
fn collect_lines(listener: TcpListener) -> thread::JoinHandle<Vec<String>> {
    thread::spawn(move || {
        let (socket, _) = listener.accept().expect("accepted");
        BufReader::new(socket)
            .lines()
            .map(|l| l.expect("line read"))
            .collect()
    })
}

fn bind() -> (TcpListener, u16) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bound");
    let port = listener.local_addr().expect("addr").port();
    (listener, port)
}

#[test]
fn transmits_each_event_as_a_line() {
    let (listener, port) = bind();
    let received = collect_lines(listener);

    let mut stream = Stream::tcp(port);
    let info = TestInfo::new(None, "X", Kind::Test, Vec::<String>::new());
    stream.test_started(&info);
    stream.test_finished(&TestResult::new(info, ResultState::Success));
    drop(stream);

    assert_eq!(
        received.join().expect("receiver finished"),
        [
            "<test-started name=\"X\" />",
            "<test-finished name=\"X\" result=\"Success\" passed=\"1\" \
             failures=\"0\" ignored=\"0\" inconclusive=\"0\" />",
        ],
    );
}

#[test]
fn streams_whole_run_in_happened_before_order() {
    let (listener, port) = bind();
    let received = collect_lines(listener);
    let registry = Registry::new();
    let suite = Suite::new("root")
        .with_test(Test::new("ok", |cx| {
            cx.write("hello\n");
            Ok(())
        }))
        .with_test(Test::new("bad", |_| Err(Verdict::failed("no <way>"))));

    let mut stream = Stream::tcp(port);
    let outcome = Orchestrator::new(&registry)
        .execute(&suite, &mut stream)
        .expect("executed");
    drop(stream);

    assert_eq!(outcome.exit_code(), 1);
    let lines = received.join().expect("receiver finished");
    assert_eq!(lines.len(), 6, "{lines:#?}");
    assert_eq!(lines[0], "<suite-started name=\"root\" />");
    assert_eq!(lines[1], "<test-started name=\"root.ok\" />");
    assert!(lines[2].ends_with("output=\"hello&#10;\" />"), "{}", lines[2]);
    assert_eq!(lines[3], "<test-started name=\"root.bad\" />");
    assert!(lines[4].contains("result=\"Failure\""), "{}", lines[4]);
    assert!(lines[4].contains("message=\"no &lt;way&gt;\""), "{}", lines[4]);
    assert!(lines[5].starts_with("<suite-finished name=\"root\" result=\"Failure\""));
}

#[test]
fn connect_failure_doesnt_affect_run() {
    let port = bind().1;
    let registry = Registry::new();
    let suite = || Suite::new("root").with_test(Test::new("ok", |_| Ok(())));

    let mut writer = TcpWriter::loopback(port);
    writer.write_all(b"<probe />\n").expect("buffered");
    assert!(writer.flush().is_err());

    let mut stream = Stream::tcp(port);
    let streamed = Orchestrator::new(&registry)
        .execute(&suite(), &mut stream)
        .expect("executed");
    let registry = Registry::new();
    let local = Orchestrator::new(&registry)
        .execute(&suite(), &mut loopunit::writer::Discard)
        .expect("executed");

    assert_eq!(streamed.exit_code(), 0);
    assert_eq!(streamed.exit_code(), local.exit_code());
}
