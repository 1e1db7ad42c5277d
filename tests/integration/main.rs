//! Integration tests for fragkey

mod canonicalization {
    use fragkey::{key, BuildOptions, FragmentKey, FragmentRegistry, FragmentType, KeyInterner};

    fn registry() -> FragmentRegistry {
        FragmentRegistry::builder()
            .register("Cpp", ["foo"])
            .register("Java", ["javacopt", "foo"])
            .build()
            .unwrap()
    }

    #[test]
    fn irrelevant_flags_share_one_key() {
        let registry = registry();
        let interner = KeyInterner::default();
        let cpp = FragmentType::new("Cpp");

        let x = BuildOptions::new()
            .with("foo", "foo", "bar")
            .with("unrelated", "unrelated", "x");
        let y = BuildOptions::new()
            .with("foo", "foo", "bar")
            .with("unrelated", "unrelated", "y");

        let a = key(&x, &cpp, &registry, &interner).unwrap();
        let b = key(&y, &cpp, &registry, &interner).unwrap();

        assert!(FragmentKey::ptr_eq(&a, &b));
        assert_eq!(a.options(), &BuildOptions::new().with("foo", "foo", "bar"));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn same_options_different_fragments_stay_apart() {
        let registry = registry();
        let interner = KeyInterner::default();
        let options = BuildOptions::new()
            .with("foo", "foo", "bar")
            .with("javacopt", "g", "true");

        let cpp = key(&options, &FragmentType::new("Cpp"), &registry, &interner).unwrap();
        let java = key(&options, &FragmentType::new("Java"), &registry, &interner).unwrap();

        assert_ne!(cpp, java);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn keying_trimmed_options_again_is_a_no_op() {
        let registry = registry();
        let interner = KeyInterner::default();
        let cpp = FragmentType::new("Cpp");
        let full = BuildOptions::new()
            .with("foo", "foo", "bar")
            .with("unrelated", "unrelated", "x");

        let first = key(&full, &cpp, &registry, &interner).unwrap();
        let again = key(first.options(), &cpp, &registry, &interner).unwrap();

        assert!(FragmentKey::ptr_eq(&first, &again));
    }
}

mod persistence {
    use fragkey::config::schema::FragmentConfig;
    use fragkey::config::Config;
    use fragkey::{BuildOptions, FragkeyError, FragmentContext, FragmentKey};

    fn context() -> FragmentContext {
        let mut config = Config::default();
        config.fragments.push(FragmentConfig {
            name: "cpp".to_string(),
            options: vec!["cpp".to_string(), "core".to_string()],
        });
        FragmentContext::from_config(&config).unwrap()
    }

    fn options() -> BuildOptions {
        BuildOptions::new()
            .with("cpp", "copt", "-O2")
            .with("core", "cpu", "k8")
            .with("java", "javacopt", "-g")
    }

    #[test]
    fn decoded_key_is_the_interned_instance() {
        let context = context();
        let original = context.key_by_name(&options(), "cpp").unwrap();

        let bytes = context.encode_key(&original).unwrap();
        let decoded = context.decode_key(&bytes).unwrap();

        assert_eq!(decoded, original);
        assert!(FragmentKey::ptr_eq(&decoded, &original));
        assert_eq!(decoded.fingerprint(), original.fingerprint());
    }

    #[test]
    fn decoding_into_a_fresh_process_context() {
        let writer = context();
        let bytes = writer
            .encode_key(&writer.key_by_name(&options(), "cpp").unwrap())
            .unwrap();

        let reader = context();
        let decoded = reader.decode_key(&bytes).unwrap();
        let rebuilt = reader.key_by_name(&options(), "cpp").unwrap();

        assert!(FragmentKey::ptr_eq(&decoded, &rebuilt));
        assert_eq!(reader.interner().len(), 1);
    }

    #[test]
    fn unknown_type_leaves_interner_untouched() {
        let writer = {
            let mut config = Config::default();
            config.fragments.push(FragmentConfig {
                name: "python".to_string(),
                options: vec![],
            });
            FragmentContext::from_config(&config).unwrap()
        };
        let bytes = writer
            .encode_key(&writer.key_by_name(&options(), "python").unwrap())
            .unwrap();

        let reader = context();
        let before = reader.interner().stats();
        let err = reader.decode_key(&bytes).unwrap_err();

        assert!(matches!(
            err,
            FragkeyError::UnresolvedFragmentType { ref name } if name == "python"
        ));
        assert!(err.hint().is_some());
        assert_eq!(reader.interner().stats(), before);
    }
}

mod concurrency {
    use fragkey::{BuildOptions, FragmentContext, FragmentKey, FragmentRegistry, KeyInterner};
    use std::sync::{Arc, Barrier};
    use std::thread;

    const THREADS: usize = 16;

    fn context() -> Arc<FragmentContext> {
        let registry = FragmentRegistry::builder()
            .register("cpp", ["cpp"])
            .build()
            .unwrap();
        Arc::new(FragmentContext::new(registry, KeyInterner::new(4)))
    }

    #[test]
    fn concurrent_requests_observe_one_instance() {
        let context = context();
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let context = Arc::clone(&context);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let options = BuildOptions::new()
                        .with("cpp", "copt", "-O2")
                        .with("java", "thread", i.to_string());
                    barrier.wait();
                    context.key_by_name(&options, "cpp").unwrap()
                })
            })
            .collect();

        let keys: Vec<FragmentKey> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(keys.iter().all(|k| FragmentKey::ptr_eq(k, &keys[0])));
        let stats = context.interner().stats();
        assert_eq!(stats.live, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, (THREADS - 1) as u64);
    }

    #[test]
    fn concurrent_distinct_keys_all_registered() {
        let context = context();

        let keys: Vec<FragmentKey> = thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|i| {
                    let context = &context;
                    scope.spawn(move || {
                        let options = BuildOptions::new().with("cpp", "copt", format!("-O{}", i));
                        context.key_by_name(&options, "cpp").unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(keys.len(), THREADS);
        assert_eq!(context.interner().len(), THREADS);

        drop(keys);
        assert!(context.interner().is_empty());
        assert_eq!(context.interner().purge(), THREADS);
    }
}
