use criterion::{black_box, criterion_group, criterion_main, Criterion};
use oracular::{arith, factor, primality, primes, rsa};
use rug::Integer;

fn bench_primes_to_1m(c: &mut Criterion) {
    // Warm the cache once so the iterations measure the read path.
    primes::sieve_eratosthenes(1_000_000);
    c.bench_function("primes_to(1_000_000).count()", |b| {
        b.iter(|| primes::primes_to(black_box(1_000_000)).count());
    });
}

fn bench_powmod_large(c: &mut Criterion) {
    let base: Integer = "123456789123456789123456789".parse().unwrap();
    let exp: Integer = "987654321987654321".parse().unwrap();
    let modulus: Integer = "1000000000000000003".parse().unwrap();
    c.bench_function("powmod(large base, large exp)", |b| {
        b.iter(|| arith::powmod(black_box(&base), black_box(&exp), black_box(&modulus)).unwrap());
    });
}

fn bench_probably_prime_m127(c: &mut Criterion) {
    let m127 = (Integer::from(1) << 127) - 1u32;
    c.bench_function("probably_prime(2^127 - 1)", |b| {
        b.iter(|| primality::probably_prime(black_box(&m127)));
    });
}

fn bench_factor_720720(c: &mut Criterion) {
    let n = Integer::from(720_720u32);
    c.bench_function("factor(720720)", |b| {
        b.iter(|| factor::factor(black_box(&n)));
    });
}

fn bench_create_key_100(c: &mut Criterion) {
    c.bench_function("create_key_bits(100)", |b| {
        b.iter(|| rsa::create_key_bits(black_box(100), 2, None).unwrap());
    });
}

criterion_group!(
    benches,
    bench_primes_to_1m,
    bench_powmod_large,
    bench_probably_prime_m127,
    bench_factor_720720,
    bench_create_key_100,
);
criterion_main!(benches);
