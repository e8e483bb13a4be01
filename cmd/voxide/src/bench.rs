//! The in-binary benchmark: timed insert/get/delete sweeps over random
//! cells, printed as operations per second.

use std::time::{Duration, Instant};

use rand::prelude::*;
use voxide_common::{Location, Region, TypeId};
use voxide_engine::{format, BehaviorHost, Printer, World};

use crate::command::{self, Command};

const COORD_BOUND: i32 = 4096;
const OPS_PER_BATCH: u32 = 100;

fn random_region(rng: &mut StdRng) -> Region {
    Region::point(Location::new(
        rng.gen_range(-COORD_BOUND..COORD_BOUND),
        rng.gen_range(-COORD_BOUND..COORD_BOUND),
        rng.gen_range(-COORD_BOUND..COORD_BOUND),
    ))
}

fn report(printer: &mut dyn Printer, name: &str, count: u64, elapsed: Duration) {
    let per_second = count as f64 / elapsed.as_secs_f64();
    if per_second > 1000.0 {
        printer.out(format_args!("{name}:\t{:.2}k / sec\n", per_second / 1000.0));
    } else {
        printer.out(format_args!("{name}:\t{per_second:.2} / sec\n"));
    }
}

fn bench_one(
    name: &str,
    limit: Duration,
    printer: &mut dyn Printer,
    mut op: impl FnMut(&mut dyn Printer),
) {
    // Command output is muted during the timed loop.
    let mut sink = voxide_engine::StdoutPrinter { muted: true };
    let start = Instant::now();
    let mut count = 0u64;
    while start.elapsed() < limit {
        for _ in 0..OPS_PER_BATCH {
            op(&mut sink);
        }
        count += u64::from(OPS_PER_BATCH);
    }
    report(printer, name, count, start.elapsed());
}

/// Run the three benchmark passes, `limit` each.
pub fn run(world: &mut World, host: &dyn BehaviorHost, millis: u64, printer: &mut dyn Printer) {
    let limit = Duration::from_millis(millis.max(1));
    let type_count = world.registry().type_count() as u32;
    let mut rng = StdRng::from_entropy();

    printer.out(format_args!("--- Benchmark Start ---\n"));

    {
        let mut rng_insert = StdRng::seed_from_u64(rng.r#gen());
        bench_one("insert", limit, printer, |sink| {
            let type_id = TypeId(rng_insert.gen_range(0..type_count));
            let type_name = world.registry().node_type(type_id).name.clone();
            command::execute(
                Command::NodeSet {
                    region: random_region(&mut rng_insert),
                    type_name,
                    assignments: Vec::new(),
                },
                world,
                host,
                sink,
            );
        });
    }

    {
        let mut rng_get = StdRng::seed_from_u64(rng.r#gen());
        bench_one("get", limit, printer, |sink| {
            command::execute(
                Command::NodeGet(random_region(&mut rng_get)),
                world,
                host,
                sink,
            );
        });
    }

    {
        let mut rng_delete = StdRng::seed_from_u64(rng.r#gen());
        bench_one("delete", limit, printer, |sink| {
            command::execute(
                Command::Delete(random_region(&mut rng_delete)),
                world,
                host,
                sink,
            );
        });
    }

    printer.out(format_args!(
        "{}",
        format::stats_lines(&world.stats())
    ));
}
