use coapspoof_msg::*;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

struct TestInput {
  token: u64,
  proxy_uri_size: usize,
  payload_size: usize,
}

impl TestInput {
  fn get_msg(&self) -> Message {
    let proxy_uri: Vec<u8> = std::iter::repeat(b'a').take(self.proxy_uri_size).collect();

    Message { id: Id(1),
              ty: Type::Con,
              ver: Version::default(),
              token: Token::from_u64(self.token),
              code: Code::new(0, 1),
              opts: vec![Opt::new(OptNumber::URI_HOST, b"127.0.0.1".to_vec()),
                         Opt::new(OptNumber::URI_PATH, b"coap2http".to_vec()),
                         Opt::new(OptNumber::PROXY_URI, proxy_uri)],
              payload: Payload(std::iter::repeat(1u8).take(self.payload_size).collect()) }
  }
}

impl std::fmt::Display for TestInput {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f,
           "tkl {} proxy uri {}b payload {}b",
           token_length(self.token),
           self.proxy_uri_size,
           self.payload_size)
  }
}

fn message_to_bytes(c: &mut Criterion) {
  let mut group = c.benchmark_group("msg/to_bytes");
  group.measurement_time(std::time::Duration::from_secs(5));

  let inputs = vec![TestInput { token: 0,
                                proxy_uri_size: 19,
                                payload_size: 0 },
                    TestInput { token: 0x055B23FA,
                                proxy_uri_size: 34,
                                payload_size: 0 },
                    TestInput { token: 0x055B23FA,
                                proxy_uri_size: 34,
                                payload_size: 128 },
                    TestInput { token: u64::MAX,
                                proxy_uri_size: 268,
                                payload_size: 1024 }];

  inputs.iter().for_each(|inp| {
                 group.bench_with_input(BenchmarkId::new("coapspoof_msg/vec", inp.to_string()),
                                        inp,
                                        |b, inp| {
                                          b.iter_batched(|| inp.get_msg(),
                                                         |m| m.try_into_bytes().unwrap(),
                                                         BatchSize::SmallInput)
                                        });
               });

  group.finish();
}

criterion_group!(benches, message_to_bytes);
criterion_main!(benches);
