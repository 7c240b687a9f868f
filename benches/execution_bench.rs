use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pati::{Interpreter, Parser, Scanner};

const FIBONACCI: &str = r#"
start LET A = 0
init LET B = 1
go CALL step(N = 40)
show PRINT "fib", A
stop END
PROC step {
  s1 LET C = A + B
  s2 LET A = B
  s3 LET B = C
  s4 IF N > 1 THEN CALL step(N = N - 1)
}
"#;

fn lexer_benchmark(c: &mut Criterion) {
    c.bench_function("tokenize fibonacci program", |b| {
        b.iter(|| Scanner::new(black_box(FIBONACCI)).scan_tokens())
    });
}

fn parser_benchmark(c: &mut Criterion) {
    let tokens = Scanner::new(FIBONACCI).scan_tokens();

    c.bench_function("parse fibonacci program", |b| {
        b.iter(|| Parser::new(black_box(tokens.clone())).parse().unwrap())
    });
}

fn interpreter_benchmark(c: &mut Criterion) {
    let program = Parser::new(Scanner::new(FIBONACCI).scan_tokens())
        .parse()
        .unwrap();

    c.bench_function("run fibonacci program", |b| {
        b.iter(|| {
            let mut interpreter = Interpreter::new(std::io::empty(), std::io::sink());
            interpreter.execute(black_box(&program))
        })
    });
}

criterion_group!(
    benches,
    lexer_benchmark,
    parser_benchmark,
    interpreter_benchmark
);
criterion_main!(benches);
