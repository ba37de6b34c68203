//! Discovers the NUMA nodes of the system, places a small cache and dataset region on each and
//! starts one worker thread per node, pinned to the first processor of that node.
//!
//! Debug-level events from the package are printed to show what discovery found.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use numa_placement::{
    AllocationFlags, MemoryRegion, NumaInfo, PageRegionAllocator, RegionSizes,
    set_thread_affinity_for,
};
use tracing::Level;

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    // Small regions so the example runs anywhere. The hashing engine uses RegionSizes::default().
    let allocator = PageRegionAllocator::new(RegionSizes::new(4 * 1024 * 1024, 16 * 1024 * 1024));

    let numa = match NumaInfo::discover(&allocator, AllocationFlags::new()) {
        Ok(numa) => Arc::new(numa),
        Err(e) => {
            eprintln!("NUMA discovery failed: {e}");
            return;
        }
    };

    println!("Discovered {} NUMA node(s).", numa.count());
    println!("Processor to node map: {:?}", numa.cpu_to_node());

    let mut workers = Vec::new();

    for (node_index, node) in numa.nodes().iter().enumerate() {
        let node_id = node.id();

        let Some(processor) = numa.nth_cpu_for_node(node_id, 1) else {
            println!("Node {node_id} has no mapped processors, not starting a worker.");
            continue;
        };

        // The worker waits until it has been pinned before it touches any memory.
        let (start_tx, start_rx) = mpsc::channel::<()>();

        let worker = thread::spawn({
            let numa = Arc::clone(&numa);

            move || {
                _ = start_rx.recv();

                // In a real service, the hashing engine would run here using the node-local
                // cache and dataset.
                let Some(node) = numa.nodes().get(node_index) else {
                    return;
                };

                println!(
                    "Worker for node {} sees a {} byte cache and a {} byte dataset.",
                    node.id(),
                    node.cache().len(),
                    node.dataset().len()
                );
            }
        });

        match set_thread_affinity_for(&worker, processor) {
            Ok(()) => println!("Pinned worker for node {node_id} to processor {processor}."),
            Err(e) => println!(
                "Worker for node {node_id} runs unpinned (status {}): {e}",
                e.status_code()
            ),
        }

        _ = start_tx.send(());
        workers.push(worker);
    }

    for worker in workers {
        worker.join().unwrap();
    }

    println!("All workers have finished.");
}
