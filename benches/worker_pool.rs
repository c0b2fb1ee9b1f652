//! Worker-pool throughput benchmark: how many small parallel batches the
//! facade can drain per second at a given pool size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sakura_lang::ast::{Leaf, Node};
use sakura_lang::config::SakuraConfig;
use sakura_lang::facade::SakuraLang;
use sakura_lang::handler::{Blossom, HandlerSchema, RunOutcome};
use sakura_lang::value::Value;
use sakura_lang::value_item::ValueItem;
use std::sync::Arc;

struct SetHandler;
impl Blossom for SetHandler {
    fn schema(&self) -> HandlerSchema {
        HandlerSchema::default()
    }
    fn run(&self, inputs: Value) -> RunOutcome {
        let key = match inputs.get_field("key") {
            Some(Value::String(s)) => s.clone(),
            _ => return RunOutcome::failure("missing 'key'"),
        };
        let value = inputs.get_field("value").cloned().unwrap_or(Value::Null);
        RunOutcome::success(Value::object(vec![(key, value)]))
    }
}

fn parallel_tree_source(fan_out: usize) -> String {
    let children: Vec<Node> = (0..fan_out)
        .map(|i| {
            Node::Leaf(
                Leaf::new("std", "set")
                    .with_input("key", ValueItem::input(Value::from(format!("k{i}"))))
                    .with_input("value", ValueItem::input(Value::Integer(i as i64))),
            )
        })
        .collect();
    let body = Node::parallel(Node::sequential(children));
    serde_json::to_string(&sakura_lang::ast::Tree {
        id: "bench".to_string(),
        relative_path: String::new(),
        root_path: String::new(),
        body: Box::new(body),
        declared_inputs: sakura_lang::value_item::ValueItemMap::new(),
    })
    .expect("serialize bench tree")
}

fn bench_parallel_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_fan_out");
    for fan_out in [1usize, 4, 16, 64] {
        let source = parallel_tree_source(fan_out);
        group.bench_with_input(BenchmarkId::from_parameter(fan_out), &source, |b, source| {
            let facade = SakuraLang::new(SakuraConfig {
                worker_count: num_cpus::get().max(1),
                ..SakuraConfig::default()
            })
            .expect("construct facade");
            facade.add_blossom("std", "set", Arc::new(SetHandler));

            b.iter(|| {
                let result = facade
                    .run_tree("bench", black_box(source), sakura_lang::value_item::ValueItemMap::new())
                    .expect("run bench tree");
                black_box(result);
            });

            facade.shutdown();
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parallel_fan_out);
criterion_main!(benches);
