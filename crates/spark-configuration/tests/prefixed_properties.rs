//! 前缀挂载的性质验证。
//!
//! # 结构说明 (How)
//! - 键由 1~3 段组成，每段形如 `[A-Z][a-z]{0,4}[0-9]`，前缀只含小写字母，
//!   因此生成的键段与前缀在忽略大小写后也不会相等，断言无需额外过滤；
//! - 对照组是“只由内层数据源构建的配置根”，性质 1 要求两者在前缀下给出相同的值。
//!
//! # 合同与边界 (What)
//! - 性质 1：`prefix:k` 与只含内层数据源的根上的 `k` 相同；
//! - 性质 2：外层已有键不受挂载影响，即便内层定义了同名键；
//! - 性质 3：`prefix` 与 `prefix:` 永远不存在；
//! - 性质 4：嵌套挂载只在 `a:c:k` 暴露内层键；
//! - 性质 5：经由前缀写入只影响该路径。

use std::collections::BTreeMap;

use proptest::prelude::*;
use spark_configuration::{ConfigurationBuilder, ConfigurationRoot};

fn key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[A-Z][a-z]{0,4}[0-9]", 1..=3).prop_map(|segments| segments.join(":"))
}

fn entries_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(key_strategy(), "[a-zA-Z0-9 ]{0,12}", 1..8)
}

fn prefix_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn memory_root(entries: &BTreeMap<String, String>) -> ConfigurationRoot {
    let mut builder = ConfigurationBuilder::new();
    builder.add_in_memory(entries.clone());
    builder.build().expect("memory root builds")
}

fn prefixed_root(
    outer: &BTreeMap<String, String>,
    prefix: &str,
    inner: &BTreeMap<String, String>,
) -> ConfigurationRoot {
    let inner = inner.clone();
    let mut builder = ConfigurationBuilder::new();
    builder
        .add_in_memory(outer.clone())
        .with_prefix(prefix, move |nested| {
            nested.add_in_memory(inner);
            Ok(())
        })
        .expect("generated prefix is valid");
    builder.build().expect("prefixed root builds")
}

proptest! {
    #[test]
    fn prefixed_lookup_matches_inner_only_root(
        prefix in prefix_strategy(),
        inner in entries_strategy(),
        candidate in key_strategy(),
    ) {
        let mounted = prefixed_root(&BTreeMap::new(), &prefix, &inner);
        let reference = memory_root(&inner);
        for key in inner.keys().chain(std::iter::once(&candidate)) {
            prop_assert_eq!(mounted.get(&format!("{prefix}:{key}")), reference.get(key));
        }
    }

    #[test]
    fn outer_keys_are_never_shadowed(
        prefix in prefix_strategy(),
        outer in entries_strategy(),
        extra in entries_strategy(),
    ) {
        // 内层同时包含外层的全部键（值不同）与额外的键。
        let mut inner: BTreeMap<String, String> = outer
            .keys()
            .map(|key| (key.clone(), format!("inner-{key}")))
            .collect();
        inner.extend(extra);

        let mounted = prefixed_root(&outer, &prefix, &inner);
        for (key, value) in &outer {
            let found = mounted.get(key);
            prop_assert_eq!(found.as_deref(), Some(value.as_str()));
        }
        for key in inner.keys().filter(|key| !outer.contains_key(*key)) {
            prop_assert_eq!(mounted.get(key), None);
        }
    }

    #[test]
    fn prefix_node_is_never_found(
        prefix in prefix_strategy(),
        inner in entries_strategy(),
    ) {
        let mounted = prefixed_root(&BTreeMap::new(), &prefix, &inner);
        prop_assert_eq!(mounted.get(&prefix), None);
        prop_assert_eq!(mounted.get(&format!("{prefix}:")), None);
    }

    #[test]
    fn nested_prefixes_expose_keys_only_at_full_path(
        outer_prefix in prefix_strategy(),
        inner_prefix in prefix_strategy(),
        inner in entries_strategy(),
    ) {
        let entries = inner.clone();
        let nested_prefix = inner_prefix.clone();
        let mut builder = ConfigurationBuilder::new();
        builder
            .with_prefix(outer_prefix.clone(), move |outer| {
                outer.with_prefix(nested_prefix, move |nested| {
                    nested.add_in_memory(entries);
                    Ok(())
                })?;
                Ok(())
            })
            .expect("generated prefix is valid");
        let root = builder.build().expect("nested root builds");

        for (key, value) in &inner {
            let found = root.get(&format!("{outer_prefix}:{inner_prefix}:{key}"));
            prop_assert_eq!(found.as_deref(), Some(value.as_str()));
            prop_assert_eq!(root.get(&format!("{outer_prefix}:{key}")), None);
            prop_assert_eq!(root.get(key), None);
        }
    }

    #[test]
    fn prefixed_writes_touch_only_their_path(
        prefix in prefix_strategy(),
        inner in entries_strategy(),
        target in key_strategy(),
        value in "[a-z]{1,8}",
    ) {
        let mounted = prefixed_root(&BTreeMap::new(), &prefix, &inner);
        let path = format!("{prefix}:{target}");
        mounted.set(&path, &value).expect("set through prefix");

        let written = mounted.get(&path);
        prop_assert_eq!(written.as_deref(), Some(value.as_str()));
        prop_assert_eq!(mounted.get(&target), None);
        for (key, original) in inner.iter().filter(|(key, _)| **key != target) {
            let untouched = mounted.get(&format!("{prefix}:{key}"));
            prop_assert_eq!(untouched.as_deref(), Some(original.as_str()));
        }
    }
}
