// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Listener`] mirroring events to a remote listener as newline-delimited
//! elements.

use std::{fmt::Write as _, io};

use crate::event::{TestInfo, TestOutput, TestResult};

use super::{out::WriteStrExt as _, Listener, TcpWriter};

/// [`Listener`] writing every event as a single-line element, flushed right
/// away:
/// ```text
/// <test-started name="suite.test" />
/// <test-finished name="suite.test" result="Success" passed="1" failures="0" ignored="0" inconclusive="0" />
/// ```
///
/// Tags are `suite-started`, `test-started`, `suite-finished` and
/// `test-finished`. Finished elements carry the `result` classification,
/// aggregate counts, and optional `message`, `stack-trace` and `output`
/// attributes. The `output` accumulates everything written since the last
/// started element.
///
/// Errors of the underlying [`io::Write`] implementor are logged and
/// discarded, so they never affect a test run.
#[derive(Debug)]
pub struct Stream<Out: io::Write> {
    /// [`io::Write`] implementor to write elements into.
    output: Out,

    /// Output captured since the last started element.
    captured: String,
}

impl Stream<TcpWriter> {
    /// Creates a new [`Stream`] connecting to the given loopback `port`.
    #[must_use]
    pub fn tcp(port: u16) -> Self {
        Self::new(TcpWriter::loopback(port))
    }
}

impl<Out: io::Write> Stream<Out> {
    /// Creates a new [`Stream`] writing into the given `output`.
    #[must_use]
    pub const fn new(output: Out) -> Self {
        Self { output, captured: String::new() }
    }

    /// Unwraps the inner [`io::Write`] implementor.
    #[must_use]
    pub fn into_inner(self) -> Out {
        self.output
    }

    /// Writes and flushes the given `element`, discarding any error.
    fn emit(&mut self, element: &str) {
        let res = self
            .output
            .write_line(element)
            .and_then(|()| self.output.flush());
        if let Err(e) = res {
            tracing::debug!(error = %e, "discarded streamed event");
        }
    }
}

impl<Out: io::Write> Listener for Stream<Out> {
    fn test_started(&mut self, info: &TestInfo) {
        self.captured.clear();
        let tag = if info.is_suite() { "suite-started" } else { "test-started" };
        self.emit(&format!("<{tag} name=\"{}\" />", escape(&info.full_name)));
    }

    fn test_output(&mut self, output: &TestOutput) {
        self.captured.push_str(&output.text);
    }

    fn test_finished(&mut self, result: &TestResult) {
        let tag = if result.info.is_suite() { "suite-finished" } else { "test-finished" };
        let counts = &result.counts;

        let mut element = format!(
            "<{tag} name=\"{}\" result=\"{}\" passed=\"{}\" failures=\"{}\" \
             ignored=\"{}\" inconclusive=\"{}\"",
            escape(&result.info.full_name),
            result.state.classification(),
            counts.passed,
            counts.failures,
            counts.ignored,
            counts.inconclusive,
        );
        let captured = std::mem::take(&mut self.captured);
        let attrs = [
            ("message", result.message.as_deref()),
            ("stack-trace", result.stack_trace.as_deref()),
            ("output", (!captured.is_empty()).then_some(captured.as_str())),
        ];
        for (name, value) in attrs {
            if let Some(v) = value {
                _ = write!(element, " {name}=\"{}\"", escape(v));
            }
        }
        element.push_str(" />");

        self.emit(&element);
    }
}

/// Escapes `value` to be placed into a double-quoted attribute on a single
/// line.
///
/// The wire format is a sequence of standalone elements, one per line, and
/// never a whole XML document (no prolog, no root element), so it's written by
/// hand rather than through `junit-report`. Newlines are escaped as `&#10;` to
/// keep every element on its own line.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::event::{Kind, ResultState};

    use super::*;

    fn test_info(name: &str) -> TestInfo {
        TestInfo::new(None, name, Kind::Test, Vec::<String>::new())
    }

    /// [`io::Write`] recording what every flush transmitted.
    #[derive(Debug, Default)]
    struct Flushes {
        pending: Vec<u8>,
        flushed: Vec<String>,
    }

    impl io::Write for Flushes {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.pending.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            let bytes = std::mem::take(&mut self.pending);
            self.flushed.push(String::from_utf8(bytes).expect("utf8"));
            Ok(())
        }
    }

    /// [`io::Write`] always failing.
    #[derive(Debug)]
    struct Broken;

    impl io::Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn flushes_each_element() {
        let mut stream = Stream::new(Flushes::default());
        let info = test_info("X");

        stream.test_started(&info);
        stream.test_finished(&TestResult::new(info, ResultState::Success));

        assert_eq!(
            stream.into_inner().flushed,
            [
                "<test-started name=\"X\" />\n",
                "<test-finished name=\"X\" result=\"Success\" passed=\"1\" \
                 failures=\"0\" ignored=\"0\" inconclusive=\"0\" />\n",
            ],
        );
    }

    #[test]
    fn escapes_attributes_and_accumulates_output() {
        let mut stream = Stream::new(Vec::new());
        let info = test_info("a<b>");

        stream.test_started(&info);
        for text in ["one\n", "two \"quoted\""] {
            stream.test_output(&TestOutput {
                test_name: info.full_name.clone(),
                text: text.into(),
            });
        }
        let mut result = TestResult::new(info, ResultState::Error);
        result.message = Some("x & y".into());
        stream.test_finished(&result);

        let written = String::from_utf8(stream.into_inner()).expect("utf8");
        assert_eq!(
            written.lines().nth(1),
            Some(
                "<test-finished name=\"a&lt;b&gt;\" result=\"Failure\" \
                 passed=\"0\" failures=\"1\" ignored=\"0\" inconclusive=\"0\" \
                 message=\"x &amp; y\" \
                 output=\"one&#10;two &quot;quoted&quot;\" />",
            ),
        );
    }

    #[test]
    fn clears_output_on_started() {
        let mut stream = Stream::new(Vec::new());
        let suite = TestInfo::new(None, "s", Kind::Suite, Vec::<String>::new());
        let test = TestInfo::new(Some("s"), "t", Kind::Test, Vec::<String>::new());

        stream.test_started(&suite);
        stream.test_output(&TestOutput {
            test_name: suite.full_name.clone(),
            text: "stale".into(),
        });
        stream.test_started(&test);
        stream.test_finished(&TestResult::new(test, ResultState::Success));

        let written = String::from_utf8(stream.into_inner()).expect("utf8");
        assert!(!written.contains("stale"), "{written}");
    }

    #[test]
    fn swallows_write_errors() {
        let mut stream = Stream::new(Broken);
        let info = test_info("X");

        stream.test_started(&info);
        stream.test_finished(&TestResult::new(info, ResultState::Success));
    }
}
