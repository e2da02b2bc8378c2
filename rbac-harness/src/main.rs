#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

#[cfg(all(target_os = "linux", target_arch = "x86_64", target_env = "gnu"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

// Every control-plane call and probe is awaited in sequence, so a single
// thread is all the pipeline uses.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    rbac_harness_runtime::Args::parse_and_run().await
}
