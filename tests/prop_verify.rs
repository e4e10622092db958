mod common;

use common::cheap_hasher;
use fieldhash::{FieldHashPlugin, PluginOptions, Schema};
use proptest::prelude::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 8,
        .. proptest::test_runner::Config::default()
    })]
    #[test]
    fn prop_encrypted_value_verifies_only_original(pwd in "[a-zA-Z0-9!@#]{1,32}", other in "[a-zA-Z0-9!@#]{1,32}") {
        prop_assume!(pwd != other);
        let mut schema = Schema::new("prop");
        let plugin = FieldHashPlugin::attach(&mut schema, &PluginOptions::new().rounds(1), cheap_hasher());
        let rt = tokio::runtime::Runtime::new().unwrap();
        let hash = rt.block_on(plugin.encrypt("password", &pwd)).unwrap();
        let rec = bson::doc! { "password": hash };
        prop_assert!(plugin.verify_sync(&rec, "password", &pwd).unwrap());
        prop_assert!(!plugin.verify_sync(&rec, "password", &other).unwrap());
    }

    #[test]
    fn prop_camel_case_names_resolve(seg_a in "[a-z][a-z0-9]{0,6}", seg_b in "[a-z][a-z0-9]{0,6}") {
        let path = format!("{seg_a}.{seg_b}");
        let mut schema = Schema::new("prop");
        let plugin = FieldHashPlugin::attach(&mut schema, &PluginOptions::new().field(path.clone()), cheap_hasher());
        let methods = plugin.registry().methods_of(&path).unwrap().clone();
        prop_assert_eq!(plugin.method(&methods.verify_sync).unwrap().field.path(), path.as_str());
        prop_assert!(methods.encrypt.starts_with("encrypt"));
    }
}
