use bindvar::access::sentinel::{INT_NULL, LONG_NULL};
use bindvar::access::{DataType, Value};
use bindvar::bind::{wire, BindError, BindHolder, BindKey, BindVariables};
use bindvar::executor::{ColumnInfo, ExecutorConfig, ParallelFilter, Row};
use bindvar::expression::{evaluate_expression, Expression};
use bindvar::session::{PreparedStatement, Session};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::thread;

#[test]
fn test_two_workers_read_bound_slots_then_clear() {
    let mut vars = BindVariables::with_positional(2);
    vars.bind_by_index(1, 42).unwrap();
    vars.bind_by_index(2, "abc").unwrap();

    // Workers borrow the registry; the scope join orders the clear after them
    thread::scope(|s| {
        for _ in 0..2 {
            let vars = &vars;
            s.spawn(move || {
                let first = vars.lookup_index(1).unwrap();
                let second = vars.lookup_index(2).unwrap();
                for _ in 0..1000 {
                    assert_eq!(first.read(), Value::Int32(42));
                    assert_eq!(second.read(), Value::String("abc".to_string()));
                }
            });
        }
    });

    vars.clear_all();

    let first = vars.lookup_index(1).unwrap();
    assert_eq!(first.holder().map(BindHolder::get_int), Some(INT_NULL));
    assert_eq!(first.read(), Value::Null);

    let second = vars.lookup_index(2).unwrap();
    assert_eq!(second.holder().and_then(BindHolder::get_str), None);
    assert_eq!(second.read(), Value::Null);
}

#[test]
fn test_concurrent_readers_observe_identical_values() {
    const THREADS: usize = 8;
    const READS: usize = 100_000;

    let mut vars = BindVariables::new();
    vars.declare_name("text");
    vars.declare_name("long");
    vars.declare_name("double");
    vars.bind_by_name("text", "a fairly long string payload that spans words").unwrap();
    vars.bind_by_name("long", i64::MAX - 1).unwrap();
    vars.bind_by_name("double", 0.1 + 0.2).unwrap();

    let expected: Vec<Value> = ["text", "long", "double"]
        .iter()
        .map(|name| vars.lookup_name(name).unwrap().read())
        .collect();

    thread::scope(|s| {
        for _ in 0..THREADS {
            let vars = &vars;
            let expected = &expected;
            s.spawn(move || {
                let slots: Vec<_> = ["text", "long", "double"]
                    .iter()
                    .map(|name| vars.lookup_name(name).unwrap())
                    .collect();
                for i in 0..READS {
                    let k = i % slots.len();
                    assert_eq!(&slots[k].read(), &expected[k]);
                }
            });
        }
    });
}

#[test]
fn test_bind_reads_back_every_kind() {
    let values = vec![
        Value::Boolean(true),
        Value::Int8(i8::MIN),
        Value::Int16(i16::MAX),
        Value::Int32(-1),
        Value::Int64(i64::MAX),
        Value::Float64(-0.5),
        Value::String(String::new()),
        Value::Timestamp(0),
        Value::Date(86_400_000),
    ];
    let mut vars = BindVariables::with_positional(values.len());
    for (i, value) in values.iter().enumerate() {
        vars.bind_by_index(i + 1, value.clone()).unwrap();
    }
    for _ in 0..100 {
        for (i, value) in values.iter().enumerate() {
            assert_eq!(&vars.lookup_index(i + 1).unwrap().read(), value);
        }
    }

    vars.clear_all();
    assert_eq!(
        vars.lookup_index(5).unwrap().holder().map(BindHolder::get_long),
        Some(LONG_NULL)
    );
    assert_eq!(
        vars.lookup_index(1).unwrap().read(),
        Value::Boolean(false)
    );
}

#[test]
fn test_failed_binds_leave_registry_unchanged() {
    let mut vars = BindVariables::with_positional(1);
    vars.declare_name("n");
    vars.bind_by_index(1, 7).unwrap();

    let before: Vec<Value> = vars.iter().map(|v| v.read()).collect();

    assert_eq!(
        vars.bind_by_index(1, true),
        Err(BindError::TypeMismatch {
            key: BindKey::index(1),
            expected: DataType::Int32,
            actual: DataType::Boolean,
        })
    );
    assert_eq!(
        vars.bind_by_index(2, 1),
        Err(BindError::IndexOutOfRange { index: 2, count: 1 })
    );
    assert_eq!(
        vars.bind_by_name("m", 1),
        Err(BindError::UndefinedVariable {
            name: "m".to_string()
        })
    );

    let after: Vec<Value> = vars.iter().map(|v| v.read()).collect();
    assert_eq!(before, after);
    assert_eq!(vars.positional_count(), 1);
    assert_eq!(vars.names().collect::<Vec<_>>(), vec!["n"]);
    assert_eq!(vars.lookup_index(1).unwrap().data_type(), Some(DataType::Int32));
}

#[test]
fn test_bind_variable_node_sits_where_a_literal_can() {
    let mut vars = BindVariables::with_positional(1);
    let node = Expression::bind_variable(vars.lookup_index(1).unwrap());
    let literal = Expression::literal(Value::Int32(5));

    vars.bind_by_index(1, 5).unwrap();
    let row = [Value::Int32(5)];
    for operand in [node, literal] {
        let expr = Expression::eq(Expression::column(0), operand);
        assert_eq!(
            evaluate_expression(&expr, &row, &vars).unwrap(),
            Value::Boolean(true)
        );
    }
}

fn schema() -> Vec<ColumnInfo> {
    vec![
        ColumnInfo::new("id", DataType::Int64),
        ColumnInfo::new("score", DataType::Float64),
        ColumnInfo::new("tag", DataType::Varchar),
    ]
}

fn random_rows(count: usize, seed: u64) -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            vec![
                Value::Int64(i as i64),
                Value::Float64(rng.gen_range(0.0..1000.0)),
                Value::String(format!("t{}", rng.gen_range(0..20))),
            ]
        })
        .collect()
}

#[test]
fn test_prepared_statement_reexecutes_with_new_binds() {
    let rows = random_rows(20_000, 11);
    let parallel = ParallelFilter::new(ExecutorConfig::new(4, 256)).unwrap();
    let single = ParallelFilter::new(ExecutorConfig::single_threaded()).unwrap();

    let mut statement =
        PreparedStatement::prepare("score BETWEEN ? AND ? AND tag IN (:a, :b)", schema())
            .unwrap();
    let original = statement.predicate().clone();

    for (low, high, a, b) in [(0.0, 500.0, "t1", "t2"), (250.0, 260.0, "t3", "t19")] {
        let vars = statement.bind_variables_mut();
        vars.bind_by_index(1, low).unwrap();
        vars.bind_by_index(2, high).unwrap();
        vars.bind_by_name("a", a).unwrap();
        vars.bind_by_name("b", b).unwrap();

        let expected: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                let Value::Float64(score) = row[1] else { return false };
                let Value::String(tag) = &row[2] else { return false };
                (low..=high).contains(&score) && (tag == a || tag == b)
            })
            .map(|(i, _)| i)
            .collect();

        assert_eq!(statement.execute(&parallel, &rows).unwrap(), expected);
        assert_eq!(statement.execute(&single, &rows).unwrap(), expected);
        assert_eq!(statement.predicate(), &original);
    }
}

#[test]
fn test_session_serializes_binds_against_executions() {
    let mut session = Session::new(ExecutorConfig::new(4, 64)).unwrap();
    session.prepare("q", "id >= $1 AND id < $2", schema()).unwrap();
    let session = Arc::new(session);
    let rows = Arc::new(random_rows(5_000, 3));

    let handles: Vec<_> = (0..4i64)
        .map(|t| {
            let session = Arc::clone(&session);
            let rows = Arc::clone(&rows);
            thread::spawn(move || {
                let filter = ParallelFilter::new(ExecutorConfig::new(2, 128)).unwrap();
                for round in 0..20i64 {
                    let low = (t * 20 + round) * 10;
                    // bind and execute under one write guard so rounds from
                    // different threads do not mix
                    let statement = session.statement("q").unwrap();
                    let mut guard = statement.write();
                    guard.bind_variables_mut().bind_by_index(1, low).unwrap();
                    guard.bind_variables_mut().bind_by_index(2, low + 10).unwrap();
                    let guard = parking_lot::RwLockWriteGuard::downgrade(guard);
                    let selected = guard.execute(&filter, &rows).unwrap();
                    let expected: Vec<usize> =
                        (low as usize..(low as usize + 10).min(rows.len())).collect();
                    assert_eq!(selected, expected);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_session_bind_while_executing() {
    let mut session = Session::new(ExecutorConfig::new(4, 32)).unwrap();
    session.prepare("q", "id = $1", schema()).unwrap();
    session.bind("q", 1, 0i64).unwrap();
    let session = Arc::new(session);
    let rows = Arc::new(random_rows(2_000, 9));

    let binder = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            for k in 0..500i64 {
                session.bind("q", 1, k % 100).unwrap();
            }
        })
    };
    let executor = {
        let session = Arc::clone(&session);
        let rows = Arc::clone(&rows);
        thread::spawn(move || {
            for _ in 0..200 {
                // each execution sees exactly one bound value
                let selected = session.execute("q", &rows).unwrap();
                assert_eq!(selected.len(), 1);
                assert!(selected[0] < 100);
            }
        })
    };

    binder.join().unwrap();
    executor.join().unwrap();
    assert_eq!(session.execute("q", &rows).unwrap(), vec![99]);
}

#[test]
fn test_wire_protocol_round() {
    let mut session = Session::new(ExecutorConfig::single_threaded()).unwrap();
    session
        .prepare_with_oids(
            "w",
            "id = $1 OR tag = $2",
            schema(),
            &[wire::type_oids::INT8, wire::type_oids::TEXT],
        )
        .unwrap();
    let rows = random_rows(100, 5);

    session
        .bind_wire("w", &[1], &[Some(&42i64.to_be_bytes()[..]), Some(&b"none"[..])])
        .unwrap();
    assert_eq!(session.execute("w", &rows).unwrap(), vec![42]);

    session
        .bind_wire("w", &[], &[Some(&b"7"[..]), None])
        .unwrap();
    assert_eq!(session.execute("w", &rows).unwrap(), vec![7]);

    let err = session
        .bind_wire("w", &[1], &[Some(&[0u8, 1][..]), None])
        .unwrap_err();
    assert!(matches!(
        err.root_cause().downcast_ref::<BindError>(),
        Some(BindError::MalformedParameter { .. })
    ));
}
