use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use hotdesk::directory::Directory;
use hotdesk::engine::Engine;
use hotdesk::model::{Facility, FacilityId};
use hotdesk::wire::{self, Handler};

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().unwrap().as_secs_f64() * 1000.0,
    );
}

async fn start_server(facilities: usize) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let engine = Arc::new(Engine::new());
    let directory = Arc::new(Directory::new());
    directory.create_admin("admin", "admin").unwrap();
    for i in 0..facilities {
        engine
            .add_facility(Facility::workstation(
                FacilityId::new(&format!("ws{i:03}")),
                "bench",
                15,
            ))
            .unwrap();
    }
    let handler = Arc::new(Handler::new(engine, directory, 15));

    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let h = handler.clone();
            tokio::spawn(async move {
                let _ = wire::process_connection(socket, h, None).await;
            });
        }
    });

    addr
}

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, writer) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        lines.next_line().await.unwrap().unwrap(); // banner
        Self { lines, writer }
    }

    async fn send(&mut self, cmd: &str) -> String {
        self.writer.write_all(cmd.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.lines.next_line().await.unwrap().unwrap()
    }

    /// Drain a listing reply; return the row count.
    async fn listing(&mut self, cmd: &str) -> usize {
        self.writer.write_all(cmd.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        let mut rows = 0;
        loop {
            let line = self.lines.next_line().await.unwrap().unwrap();
            if line.starts_with("ROW ") {
                rows += 1;
            } else {
                return rows;
            }
        }
    }
}

async fn phase1_sequential_bookings(addr: SocketAddr, n: usize) {
    let mut client = Client::connect(addr).await;
    client.send("LOGIN admin admin").await;

    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut latencies = Vec::with_capacity(n);
    let start = Instant::now();

    for i in 0..n {
        let date = base.checked_add_days(Days::new(i as u64)).unwrap();
        let date = date.format("%y-%m-%d");
        let cmd = format!("BOOK ws000, {date} 09:00, {date} 17:00");
        let t = Instant::now();
        let reply = client.send(&cmd).await;
        assert_eq!(reply, "OK booked", "unexpected reply: {reply}");
        latencies.push(t.elapsed());
    }

    let elapsed = start.elapsed();
    println!(
        "  {n} sequential bookings in {:.2}s ({:.0} ops/s)",
        elapsed.as_secs_f64(),
        n as f64 / elapsed.as_secs_f64()
    );
    print_latency("booking latency", &mut latencies);
}

async fn phase2_availability_queries(addr: SocketAddr, n: usize) {
    let mut client = Client::connect(addr).await;
    client.send("LOGIN admin admin").await;

    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut latencies = Vec::with_capacity(n);

    for i in 0..n {
        let date = base.checked_add_days(Days::new((i % 365) as u64)).unwrap();
        let cmd = format!("FREE {} ws000", date.format("%y-%m-%d"));
        let t = Instant::now();
        let rows = client.listing(&cmd).await;
        assert_eq!(rows, 1);
        latencies.push(t.elapsed());
    }

    print_latency("availability latency", &mut latencies);
}

async fn phase3_concurrent_clients(addr: SocketAddr, clients: usize, per_client: usize) {
    let start = Instant::now();
    let mut handles = Vec::new();

    for c in 0..clients {
        let handle = tokio::spawn(async move {
            let mut client = Client::connect(addr).await;
            client.send("LOGIN admin admin").await;
            let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
            let mut placed = 0usize;
            for i in 0..per_client {
                let date = base
                    .checked_add_days(Days::new((c * per_client + i) as u64))
                    .unwrap();
                let date = date.format("%y-%m-%d");
                // Each client books its own facility: no contention on slots,
                // plenty on the shared maps.
                let cmd = format!("BOOK ws{:03}, {date} 09:00, {date} 11:00", c + 1);
                if client.send(&cmd).await == "OK booked" {
                    placed += 1;
                }
            }
            placed
        });
        handles.push(handle);
    }

    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap();
    }
    let elapsed = start.elapsed();
    println!(
        "  {clients} clients x {per_client} bookings: {total} placed in {:.2}s ({:.0} ops/s)",
        elapsed.as_secs_f64(),
        total as f64 / elapsed.as_secs_f64()
    );
}

#[tokio::main]
async fn main() {
    let n: usize = std::env::var("HOTDESK_BENCH_N")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2000);

    println!("hotdesk stress bench");
    let addr = start_server(33).await;

    println!("phase 1: sequential bookings");
    phase1_sequential_bookings(addr, n).await;

    println!("phase 2: availability queries");
    phase2_availability_queries(addr, n).await;

    println!("phase 3: concurrent clients");
    phase3_concurrent_clients(addr, 32, 50).await;
}
