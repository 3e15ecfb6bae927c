use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;

use ast_js::loc::TokenPos;
use ast_js::JsOp;
use ast_js::ParseNodeKind;
use bind_js::BindOptions;
use bind_js::Binder;
use bind_js::DeclKind;
use bind_js::FunctionSyntax;

#[derive(Clone, Default)]
struct SharedWriter {
  buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedWriter {
  fn into_inner(self) -> Vec<u8> {
    match Arc::try_unwrap(self.buffer) {
      Ok(buffer) => buffer.into_inner().unwrap(),
      Err(arc) => arc.lock().unwrap().clone(),
    }
  }
}

struct SharedWriterGuard<'a> {
  buffer: &'a Arc<Mutex<Vec<u8>>>,
}

impl<'a> io::Write for SharedWriterGuard<'a> {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.buffer.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl<'a> MakeWriter<'a> for SharedWriter {
  type Writer = SharedWriterGuard<'a>;

  fn make_writer(&'a self) -> Self::Writer {
    SharedWriterGuard {
      buffer: &self.buffer,
    }
  }
}

#[test]
fn binding_emits_function_analysis_span() {
  let writer = SharedWriter::default();
  let subscriber = tracing_subscriber::fmt()
    .with_span_events(FmtSpan::CLOSE)
    .with_max_level(tracing::Level::DEBUG)
    .with_ansi(false)
    .with_writer(writer.clone())
    .finish();
  let _guard = tracing::subscriber::set_default(subscriber);

  let mut b = Binder::new(BindOptions::default());
  let f = b.atom("f");
  let x = b.atom("x");
  let fun = b
    .begin_function(Some(f), FunctionSyntax::Statement, TokenPos::on_line(1, 0, 10))
    .unwrap();
  b.define(DeclKind::Arg, x, TokenPos::on_line(1, 11, 12)).unwrap();
  b.use_name(x, TokenPos::on_line(1, 22, 23)).unwrap();
  let body = b
    .arena
    .make_empty_list(ParseNodeKind::StatementList, JsOp::Nop, TokenPos::on_line(1, 14, 26))
    .unwrap();
  b.end_function(fun, body).unwrap();
  let unit = b.finish();
  assert_eq!(unit.arena.funboxes.len(), 1);

  drop(_guard);
  let output = String::from_utf8(writer.into_inner()).unwrap();
  assert!(
    output.contains("analyze_functions"),
    "expected analyze_functions span output, got: {output}"
  );
  assert!(
    output.contains("function kinds"),
    "expected function kind summary, got: {output}"
  );
  assert!(output.contains("bound unit"));
}
