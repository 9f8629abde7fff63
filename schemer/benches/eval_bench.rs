use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use schemer::{Interpreter, StringIoAdapter};
use std::hint::black_box;

fn run_program(program: &str) -> Option<String> {
  let mut interpreter = Interpreter::new(StringIoAdapter::new());
  interpreter
    .eval_str(program)
    .ok()
    .map(|value| value.to_string())
}

fn bench_recursive_sum(c: &mut Criterion) {
  let mut group = c.benchmark_group("recursive_sum");

  for n in [10, 100, 500].iter() {
    group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
      let program = format!(
        r#"
(define sum-to
  (lambda (n) (if (< n 1) 0 (+ n (sum-to (+ n -1))))))
(sum-to {})
"#,
        n
      );

      b.iter(|| black_box(run_program(&program)))
    });
  }

  group.finish();
}

fn bench_letrec_loop(c: &mut Criterion) {
  let mut group = c.benchmark_group("letrec_loop");

  for n in [10, 100, 500].iter() {
    group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
      let program = format!(
        r#"
(letrec ((count-up (lambda (i acc)
                     (if (< i {}) (count-up (+ i 1) (cons i acc)) acc))))
  (count-up 0 '()))
"#,
        n
      );

      b.iter(|| black_box(run_program(&program)))
    });
  }

  group.finish();
}

fn bench_closures(c: &mut Criterion) {
  c.bench_function("closure_counter", |b| {
    let program = r#"
(define make-counter
  (lambda ()
    (let ((n 0))
      (lambda () (set! n (+ n 1)) n))))
(define tick (make-counter))
(tick) (tick) (tick) (tick) (tick)
(tick) (tick) (tick) (tick) (tick)
"#;

    b.iter(|| black_box(run_program(program)))
  });

  c.bench_function("closure_variadic", |b| {
    let program = r#"
(define collect (lambda args args))
(collect 1 2 3 4 5 6 7 8 9 10)
"#;

    b.iter(|| black_box(run_program(program)))
  });

  c.bench_function("list_append", |b| {
    let program = r#"
(define xs '(1 2 3 4 5 6 7 8 9 10))
(append (append xs xs) (append xs xs))
"#;

    b.iter(|| black_box(run_program(program)))
  });
}

criterion_group!(
  benches,
  bench_recursive_sum,
  bench_letrec_loop,
  bench_closures
);

criterion_main!(benches);
