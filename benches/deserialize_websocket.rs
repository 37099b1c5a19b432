/// Benchmarks for WebSocket frame decoding.
///
/// Every inbound frame is decoded twice on the hot path: once into the channel envelope so it
/// can be routed, then again from the `data` payload into the subscriber's typed update.
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use exchange_client_sdk::ws::types::response::{
    BalanceUpdate, InboundMessage, OrderUpdate, OrderbookUpdate, TickerUpdate, TradeUpdate,
};
use serde_json::Value;

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("websocket/envelope");

    let ticker_msg = r#"{
        "channel": "ticker",
        "event": "update",
        "data": {"symbol": "BTC-USDT", "last_price": "50000.5", "bid": "50000", "ask": "50001"},
        "timestamp": "2024-01-01T00:00:00Z"
    }"#;
    group.throughput(Throughput::Bytes(ticker_msg.len() as u64));
    group.bench_function("InboundMessage::Data", |b| {
        b.iter(|| {
            let message: InboundMessage = serde_json::from_str(std::hint::black_box(ticker_msg))
                .expect("Deserialization should succeed");
            if let InboundMessage::Data(data) = message {
                std::hint::black_box(data.routing_key());
            }
        });
    });

    let pong_msg = r#"{"type": "pong"}"#;
    group.throughput(Throughput::Bytes(pong_msg.len() as u64));
    group.bench_function("InboundMessage::Control", |b| {
        b.iter(|| {
            let _: InboundMessage = serde_json::from_str(std::hint::black_box(pong_msg))
                .expect("Deserialization should succeed");
        });
    });

    group.finish();
}

fn orderbook(levels: usize) -> String {
    let side = |start: u32, step: i32| {
        (0..levels)
            .map(|i| {
                let price = i64::from(start) + i64::from(step) * i64::try_from(i).unwrap_or(0);
                format!(r#"["{price}.5", "{}.25"]"#, i + 1)
            })
            .collect::<Vec<_>>()
            .join(",")
    };

    format!(
        r#"{{"symbol": "BTC-USDT", "bids": [{}], "asks": [{}], "sequence": 1}}"#,
        side(50_000, -1),
        side(50_001, 1)
    )
}

fn bench_orderbook(c: &mut Criterion) {
    let mut group = c.benchmark_group("websocket/orderbook");

    for levels in [1, 5, 20, 100] {
        let json = orderbook(levels);
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("OrderbookUpdate", levels),
            &json,
            |b, json| {
                b.iter(|| {
                    let _: OrderbookUpdate = serde_json::from_str(std::hint::black_box(json))
                        .expect("Deserialization should succeed");
                });
            },
        );
    }

    // The router hands subscribers a `Value`, so this is the path callbacks actually take
    let value: Value = serde_json::from_str(&orderbook(20)).expect("valid JSON");
    group.bench_function("OrderbookUpdate/from_value", |b| {
        b.iter(|| {
            let _: OrderbookUpdate =
                serde_json::from_value(std::hint::black_box(value.clone()))
                    .expect("Deserialization should succeed");
        });
    });

    group.finish();
}

fn bench_payloads(c: &mut Criterion) {
    let mut group = c.benchmark_group("websocket/payloads");

    let trade = r#"{
        "id": 918273,
        "symbol": "ETH-USDT",
        "price": "3000.25",
        "quantity": "0.4",
        "side": "buy",
        "timestamp": "2024-01-01T00:00:00Z"
    }"#;
    group.throughput(Throughput::Bytes(trade.len() as u64));
    group.bench_function("TradeUpdate", |b| {
        b.iter(|| {
            let _: TradeUpdate = serde_json::from_str(std::hint::black_box(trade))
                .expect("Deserialization should succeed");
        });
    });

    let ticker = r#"{
        "symbol": "BTC-USDT",
        "last_price": "50000.5",
        "bid": "50000",
        "ask": "50001",
        "volume_24h": "1234.5678",
        "change_24h": "-1.25"
    }"#;
    group.throughput(Throughput::Bytes(ticker.len() as u64));
    group.bench_function("TickerUpdate", |b| {
        b.iter(|| {
            let _: TickerUpdate = serde_json::from_str(std::hint::black_box(ticker))
                .expect("Deserialization should succeed");
        });
    });

    let order = r#"{
        "id": "ord-1",
        "symbol": "BTC-USDT",
        "side": "sell",
        "type": "limit",
        "status": "partially_filled",
        "price": "50100",
        "quantity": "1",
        "filled_quantity": "0.3",
        "updated_at": "2024-01-01T00:00:00Z"
    }"#;
    group.throughput(Throughput::Bytes(order.len() as u64));
    group.bench_function("OrderUpdate", |b| {
        b.iter(|| {
            let _: OrderUpdate = serde_json::from_str(std::hint::black_box(order))
                .expect("Deserialization should succeed");
        });
    });

    let balance = r#"{"asset": "USDT", "available": "1500.5", "locked": "20"}"#;
    group.throughput(Throughput::Bytes(balance.len() as u64));
    group.bench_function("BalanceUpdate", |b| {
        b.iter(|| {
            let _: BalanceUpdate = serde_json::from_str(std::hint::black_box(balance))
                .expect("Deserialization should succeed");
        });
    });

    group.finish();
}

criterion_group!(
    websocket_benches,
    bench_envelope,
    bench_orderbook,
    bench_payloads
);
criterion_main!(websocket_benches);
