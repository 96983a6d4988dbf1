use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hart_rs::hart::frame::{decode, encode, parse_frame, StartDelimiter};
use hart_rs::{demo_device, FixedNoise, HartFrame};
use nom::IResult;

fn benchmark_encode_frame(c: &mut Criterion) {
    let address = [0xBE, 0xE9, 0x00, 0x27, 0x11];
    let data = [0x20u8; 28];

    c.bench_function("encode_long_frame", |b| {
        b.iter(|| {
            let frame = encode(
                black_box(5),
                StartDelimiter::LongRequest,
                black_box(&address),
                18,
                black_box(&data),
            );
            let _ = black_box(frame);
        })
    });
}

fn benchmark_parse_frame(c: &mut Criterion) {
    let data = encode(5, StartDelimiter::ShortRequest, &[0x86], 3, &[]).unwrap();

    c.bench_function("parse_frame", |b| {
        b.iter(|| {
            let result: IResult<&[u8], HartFrame> = parse_frame(black_box(&data));
            let _ = black_box(result);
        })
    });
}

fn benchmark_device_dispatch(c: &mut Criterion) {
    let mut device = demo_device(6).unwrap().with_noise(Box::new(FixedNoise));
    let request = decode(&encode(5, StartDelimiter::ShortRequest, &[0x86], 3, &[]).unwrap()).unwrap();

    c.bench_function("dispatch_command_3", |b| {
        b.iter(|| {
            let response = device.handle(black_box(&request));
            let _ = black_box(response.to_frame(5));
        })
    });
}

criterion_group!(
    benches,
    benchmark_encode_frame,
    benchmark_parse_frame,
    benchmark_device_dispatch
);
criterion_main!(benches);
