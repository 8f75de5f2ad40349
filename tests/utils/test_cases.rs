/// Protocol tests run against every provider.
///
/// `$provider` evaluates to an `Option` of the provider under test, `None` skips the test.
macro_rules! test_cases {
    ($provider:expr) => {
        use crate::utils::{
            compress, compress_through, decompress, decompress_through, seeded, BLOCK,
        };
        use bytes::Bytes;
        use zlib_stream::{Compressor, Decompressor, Error, ZStream, ZlibProvider};

        #[test]
        #[ntest::timeout(10000)]
        fn empty() {
            let Some(provider) = $provider else { return };
            let mut compressor = provider.create_compressor().unwrap();
            let mut decompressor = provider.create_decompressor().unwrap();

            let compressed = compress(&mut compressor, &[]).unwrap();
            assert!(!compressed.is_empty());
            assert_eq!(utils::flate2_decompress(&compressed), &[][..]);

            let output = decompress(&mut decompressor, &compressed).unwrap();
            assert_eq!(output, &[][..]);

            compressor.close();
            decompressor.close();
        }

        #[test]
        #[ntest::timeout(10000)]
        fn seeded_round_trips() {
            utils::init_tracing();
            let Some(provider) = $provider else { return };

            for seed in 0..4 {
                let input = seeded(seed);
                let mut compressor = provider.create_compressor().unwrap();
                let mut decompressor = provider.create_decompressor().unwrap();

                let compressed = compress(&mut compressor, &input).unwrap();
                assert_eq!(utils::flate2_decompress(&compressed), input, "seed {seed}");
                let output = decompress(&mut decompressor, &compressed).unwrap();
                assert_eq!(output, input, "seed {seed}");

                compressor.close();
                decompressor.close();
            }
        }

        #[test]
        #[ntest::timeout(10000)]
        fn long_compressible_input() {
            let Some(provider) = $provider else { return };
            let input = utils::runs(7, 100 * BLOCK);
            let mut compressor = provider.create_compressor().unwrap();
            let mut decompressor = provider.create_decompressor().unwrap();

            let compressed = compress(&mut compressor, &input).unwrap();
            assert!(compressed.len() < input.len());
            assert_eq!(decompress(&mut decompressor, &compressed).unwrap(), input);

            compressor.close();
            decompressor.close();
        }

        #[test]
        #[ntest::timeout(10000)]
        fn reset_reuses_streams() {
            let Some(provider) = $provider else { return };
            let input = seeded(1);
            let mut compressor = provider.create_compressor().unwrap();
            let mut decompressor = provider.create_decompressor().unwrap();

            let mut results = Vec::new();
            for _ in 0..3 {
                let compressed = compress(&mut compressor, &input).unwrap();
                let output = decompress(&mut decompressor, &compressed).unwrap();
                assert_eq!(output, input);
                results.push(compressed);

                compressor.reset().unwrap();
                decompressor.reset().unwrap();
                assert!(compressor.needs_input());
                assert!(decompressor.needs_input());
            }
            assert_eq!(results[0], results[1]);
            assert_eq!(results[1], results[2]);

            compressor.close();
            decompressor.close();
        }

        #[test]
        #[ntest::timeout(10000)]
        fn input_state_transitions() {
            let Some(provider) = $provider else { return };
            let mut compressor = provider.create_compressor().unwrap();

            assert!(compressor.needs_input());
            assert!(!compressor.finished());

            compressor
                .set_input(Box::new(Bytes::from_static(b"abc")))
                .unwrap();
            assert!(!compressor.needs_input());

            let mut block = [0u8; BLOCK];
            while !compressor.needs_input() {
                compressor.compress(&mut &mut block[..]).unwrap();
            }
            assert!(!compressor.finished());

            compressor.finish();
            assert!(!compressor.needs_input());
            while !compressor.finished() {
                compressor.compress(&mut &mut block[..]).unwrap();
                assert!(!(compressor.needs_input() && compressor.finished()));
            }
            assert!(!compressor.needs_input());
            assert_eq!(compressor.compress(&mut &mut block[..]).unwrap(), 0);

            compressor.close();
        }

        #[test]
        #[ntest::timeout(10000)]
        fn protocol_violations() {
            let Some(provider) = $provider else { return };
            let mut compressor = provider.create_compressor().unwrap();
            let mut decompressor = provider.create_decompressor().unwrap();
            let mut block = [0u8; BLOCK];

            let err = decompressor
                .decompress(&mut &mut block[..])
                .unwrap_err();
            assert!(matches!(err, Error::Protocol(_)));

            compressor
                .set_input(Box::new(Bytes::from_static(b"first")))
                .unwrap();
            let err = compressor
                .set_input(Box::new(Bytes::from_static(b"second")))
                .unwrap_err();
            assert!(matches!(err, Error::Protocol(_)));

            compressor.close();
            decompressor.close();
        }

        #[test]
        #[ntest::timeout(10000)]
        fn closed_streams_reject_use() {
            let Some(provider) = $provider else { return };
            let mut compressor = provider.create_compressor().unwrap();
            let mut decompressor = provider.create_decompressor().unwrap();
            let mut block = [0u8; BLOCK];

            compressor.close();
            compressor.close();
            decompressor.close();

            let err = compressor
                .set_input(Box::new(Bytes::from_static(b"data")))
                .unwrap_err();
            assert!(matches!(err, Error::Closed));
            compressor.finish();
            let err = compressor.compress(&mut &mut block[..]).unwrap_err();
            assert!(matches!(err, Error::Closed));
            assert!(matches!(decompressor.reset(), Err(Error::Closed)));
        }

        #[test]
        #[ntest::timeout(10000)]
        fn malformed_input() {
            let Some(provider) = $provider else { return };
            let mut decompressor = provider.create_decompressor().unwrap();

            let result = decompress(&mut decompressor, b"\x78\x9c not deflate data");
            assert!(matches!(result, Err(Error::Malformed(_))));

            decompressor.reset().unwrap();
            let compressed = utils::flate2_compress(b"recovered");
            assert_eq!(
                decompress(&mut decompressor, &compressed).unwrap(),
                b"recovered"
            );
            decompressor.close();
        }

        #[test]
        #[ntest::timeout(10000)]
        fn truncated_input_never_finishes() {
            let Some(provider) = $provider else { return };
            let mut decompressor = provider.create_decompressor().unwrap();

            let compressed = utils::flate2_compress(&seeded(2));
            let result = decompress(&mut decompressor, &compressed[..compressed.len() - 4]);
            assert!(matches!(result, Err(Error::Protocol(_))));
            assert!(decompressor.needs_input());
            assert!(!decompressor.finished());
            decompressor.close();
        }

        #[test]
        #[ntest::timeout(10000)]
        fn small_drains_deliver_flushed_output() {
            let Some(provider) = $provider else { return };
            let mut decompressor = provider.create_decompressor().unwrap();
            let input = utils::random_bytes(11, 100);

            decompressor
                .set_input(Box::new(Bytes::from(utils::flate2_sync_flush(&input))))
                .unwrap();
            let mut block = [0u8; 7];
            let mut output = Vec::new();
            while !decompressor.needs_input() {
                let len = decompressor.decompress(&mut &mut block[..]).unwrap();
                output.extend_from_slice(&block[..len]);
                if output.len() < input.len() {
                    let missing = input.len() - output.len();
                    assert!(!decompressor.needs_input(), "{missing} bytes held back");
                }
            }
            assert_eq!(output, input);
            assert!(!decompressor.finished());
            decompressor.close();
        }

        #[test]
        #[ntest::timeout(10000)]
        fn tiny_output_blocks_round_trip() {
            let Some(provider) = $provider else { return };
            let mut compressor = provider.create_compressor().unwrap();
            let mut decompressor = provider.create_decompressor().unwrap();

            for seed in [0, 1] {
                let input = seeded(seed);
                let compressed = compress_through(&mut compressor, &input, 5).unwrap();
                assert_eq!(utils::flate2_decompress(&compressed), input, "seed {seed}");
                let output = decompress_through(&mut decompressor, &compressed, 5).unwrap();
                assert_eq!(output, input, "seed {seed}");

                compressor.reset().unwrap();
                decompressor.reset().unwrap();
            }
            compressor.close();
            decompressor.close();
        }

        #[test]
        #[ntest::timeout(10000)]
        fn trailing_bytes_are_left_unconsumed() {
            let Some(provider) = $provider else { return };
            let mut decompressor = provider.create_decompressor().unwrap();

            let mut data = utils::flate2_compress(b"payload");
            data.extend_from_slice(b"GARBAGE");
            decompressor.set_input(Box::new(Bytes::from(data))).unwrap();
            let mut block = [0u8; BLOCK];
            let mut output = Vec::new();
            while !decompressor.finished() {
                let len = decompressor.decompress(&mut &mut block[..]).unwrap();
                output.extend_from_slice(&block[..len]);
            }
            assert_eq!(output, b"payload");
            assert_eq!(decompressor.remaining(), b"GARBAGE".len());
            decompressor.close();
        }

        #[test]
        #[ntest::timeout(10000)]
        fn decodes_reference_encoder() {
            let Some(provider) = $provider else { return };
            let mut decompressor = provider.create_decompressor().unwrap();

            for seed in 0..4 {
                let input = seeded(seed);
                let compressed = utils::flate2_compress(&input);
                assert_eq!(decompress(&mut decompressor, &compressed).unwrap(), input);
                decompressor.reset().unwrap();
            }
            decompressor.close();
        }
    };
}
