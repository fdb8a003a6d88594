use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempo::{MetricSample, StatsdClient};

pub const NUM_THREADS: u64 = 10;
pub const NUM_ITERATIONS: u64 = 100;

#[allow(dead_code)]
pub fn run_arc_threaded_test(client: StatsdClient, num_threads: u64, iterations: u64) {
    let shared_client = Arc::new(client);

    let threads: Vec<_> = (0..num_threads)
        .map(|_| {
            let local_client = Arc::clone(&shared_client);

            thread::spawn(move || {
                for i in 0..iterations {
                    let i = i as i64;
                    local_client.incr("some.counter", i + 1).unwrap();
                    local_client.decr("some.counter", i + 1).unwrap();
                    local_client.timing("some.timer", Duration::from_millis(i as u64)).unwrap();
                    local_client.gauge("some.gauge", i).unwrap();
                    local_client.fgauge("some.gauge", i as f64 / 2.0).unwrap();
                    local_client.submit(MetricSample::gauge("some.queued", i, 1.0)).unwrap();
                    thread::sleep(Duration::from_millis(1));
                }
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }

    shared_client.close().unwrap();
}
