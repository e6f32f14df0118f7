use std::time::Duration;

use redlite::{Client, RedisResult, SetOptions, StorageConfig, Value};

async fn setup_client() -> Client {
    Client::open(StorageConfig::new()).await.unwrap()
}

mod string_tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let client = setup_client().await;
        client.set("key1", "value1").await.unwrap();
        let result: Option<String> = client.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_set_overwrite() {
        let client = setup_client().await;
        client.set("key1", "value1").await.unwrap();
        client.set("key1", "value2").await.unwrap();
        let result: Option<String> = client.get("key1").await.unwrap();
        assert_eq!(result, Some("value2".to_string()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let client = setup_client().await;
        let result: Option<String> = client.get("nonexistent").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_set_preserves_ttl() {
        let client = setup_client().await;
        client.set("key1", "value1").await.unwrap();
        client.expire("key1", 100).await.unwrap();
        client.set("key1", "value2").await.unwrap();
        let ttl = client.ttl("key1").await.unwrap();
        assert!(ttl > 0 && ttl <= 100);
        let result: Option<String> = client.get("key1").await.unwrap();
        assert_eq!(result, Some("value2".to_string()));
    }

    #[tokio::test]
    async fn test_mget_preserves_order() {
        let client = setup_client().await;
        client.set("a", "1").await.unwrap();
        client.set("c", "3").await.unwrap();
        let result: Vec<Option<String>> = client.mget(vec!["a", "b", "c"]).await.unwrap();
        assert_eq!(
            result,
            vec![Some("1".to_string()), None, Some("3".to_string())]
        );
    }

    #[tokio::test]
    async fn test_set_nx() {
        let client = setup_client().await;
        let written = client
            .set_options("key1", "first", SetOptions::nx())
            .await
            .unwrap();
        assert!(written);
        let written = client
            .set_options("key1", "second", SetOptions::nx())
            .await
            .unwrap();
        assert!(!written);
        let result: Option<String> = client.get("key1").await.unwrap();
        assert_eq!(result, Some("first".to_string()));
    }

    #[tokio::test]
    async fn test_set_xx() {
        let client = setup_client().await;
        let written = client
            .set_options("key1", "value", SetOptions::xx())
            .await
            .unwrap();
        assert!(!written);
        client.set("key1", "value").await.unwrap();
        let written = client
            .set_options("key1", "updated", SetOptions::xx())
            .await
            .unwrap();
        assert!(written);
        let result: Option<String> = client.get("key1").await.unwrap();
        assert_eq!(result, Some("updated".to_string()));
    }

    #[tokio::test]
    async fn test_set_ex_sets_ttl() {
        let client = setup_client().await;
        client
            .set_options("key1", "value", SetOptions::ex(60))
            .await
            .unwrap();
        let ttl = client.ttl("key1").await.unwrap();
        assert!(ttl > 0 && ttl <= 60);
    }

    #[tokio::test]
    async fn test_binary_data() {
        let client = setup_client().await;
        let binary: Vec<u8> = vec![0x00, 0xFF, 0x42, 0x13, 0x37];
        client.set("key1", binary.clone()).await.unwrap();
        let result: Vec<u8> = client.get("key1").await.unwrap();
        assert_eq!(result, binary);
    }

    #[tokio::test]
    async fn test_unicode_strings() {
        let client = setup_client().await;
        let unicode_str = "你好世界 🌍 Привет мир";
        client.set("key1", unicode_str).await.unwrap();
        let result: Option<String> = client.get("key1").await.unwrap();
        assert_eq!(result, Some(unicode_str.to_string()));
    }

    #[tokio::test]
    async fn test_empty_string_value() {
        let client = setup_client().await;
        client.set("key1", "").await.unwrap();
        let result: Option<String> = client.get("key1").await.unwrap();
        assert_eq!(result, Some(String::new()));
    }
}

mod list_tests {
    use super::*;

    #[tokio::test]
    async fn test_lpush_ordering() {
        let client = setup_client().await;
        let len = client.lpush("list", vec!["v1", "v2", "v3"]).await.unwrap();
        assert_eq!(len, 3);
        let range: Vec<String> = client.lrange("list", 0, -1).await.unwrap();
        assert_eq!(range, vec!["v3", "v2", "v1"]);
        let popped: Option<String> = client.lpop("list").await.unwrap();
        assert_eq!(popped, Some("v3".to_string()));
        let popped: Option<String> = client.rpop("list").await.unwrap();
        assert_eq!(popped, Some("v1".to_string()));
        let range: Vec<String> = client.lrange("list", 0, -1).await.unwrap();
        assert_eq!(range, vec!["v2"]);
    }

    #[tokio::test]
    async fn test_rpush_appends_in_order() {
        let client = setup_client().await;
        client.rpush("list", vec!["a", "b"]).await.unwrap();
        let len = client.rpush("list", "c").await.unwrap();
        assert_eq!(len, 3);
        let range: Vec<String> = client.lrange("list", 0, -1).await.unwrap();
        assert_eq!(range, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_pop_empty_returns_none() {
        let client = setup_client().await;
        let popped: Option<String> = client.lpop("missing").await.unwrap();
        assert_eq!(popped, None);
        let popped: Option<String> = client.rpop("missing").await.unwrap();
        assert_eq!(popped, None);
    }

    #[tokio::test]
    async fn test_lpop_after_lpush_roundtrip() {
        let client = setup_client().await;
        client.lpush("list", "only").await.unwrap();
        let popped: Option<String> = client.lpop("list").await.unwrap();
        assert_eq!(popped, Some("only".to_string()));
        assert_eq!(client.llen("list").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lrange_negative_indices() {
        let client = setup_client().await;
        client.rpush("list", vec!["a", "b", "c", "d"]).await.unwrap();
        let tail: Vec<String> = client.lrange("list", -2, -1).await.unwrap();
        assert_eq!(tail, vec!["c", "d"]);
        let full: Vec<String> = client.lrange("list", -4, -1).await.unwrap();
        assert_eq!(full, vec!["a", "b", "c", "d"]);
        let clamped: Vec<String> = client.lrange("list", -100, 100).await.unwrap();
        assert_eq!(clamped, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_lrange_start_after_stop() {
        let client = setup_client().await;
        client.rpush("list", vec!["a", "b"]).await.unwrap();
        let range: Vec<String> = client.lrange("list", 1, 0).await.unwrap();
        assert!(range.is_empty());
    }

    #[tokio::test]
    async fn test_lrange_missing_key() {
        let client = setup_client().await;
        let range: Vec<String> = client.lrange("missing", 0, -1).await.unwrap();
        assert!(range.is_empty());
    }

    #[tokio::test]
    async fn test_interleaved_ops_keep_order() {
        let client = setup_client().await;
        client.rpush("list", vec!["b", "c"]).await.unwrap();
        client.lpush("list", "a").await.unwrap();
        client.rpush("list", "d").await.unwrap();
        let _: Option<String> = client.lpop("list").await.unwrap();
        client.lpush("list", "a2").await.unwrap();
        let range: Vec<String> = client.lrange("list", 0, -1).await.unwrap();
        assert_eq!(range, vec!["a2", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_rpoplpush_moves_tail_to_head() {
        let client = setup_client().await;
        client.rpush("src", vec!["a", "b", "c"]).await.unwrap();
        let moved: Option<String> = client.rpoplpush("src", "dst").await.unwrap();
        assert_eq!(moved, Some("c".to_string()));
        let src: Vec<String> = client.lrange("src", 0, -1).await.unwrap();
        assert_eq!(src, vec!["a", "b"]);
        let dst: Vec<String> = client.lrange("dst", 0, -1).await.unwrap();
        assert_eq!(dst, vec!["c"]);
    }

    #[tokio::test]
    async fn test_rpoplpush_preserves_total_length() {
        let client = setup_client().await;
        client.rpush("src", vec!["1", "2", "3"]).await.unwrap();
        client.rpush("dst", "0").await.unwrap();
        client
            .rpoplpush::<_, Option<String>>("src", "dst")
            .await
            .unwrap();
        let total = client.llen("src").await.unwrap() + client.llen("dst").await.unwrap();
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn test_rpoplpush_empty_source() {
        let client = setup_client().await;
        let moved: Option<String> = client.rpoplpush("missing", "dst").await.unwrap();
        assert_eq!(moved, None);
        assert_eq!(client.exists("dst").await.unwrap(), 0);
    }
}

mod hash_tests {
    use super::*;

    #[tokio::test]
    async fn test_hset_upsert_counts() {
        let client = setup_client().await;
        assert_eq!(client.hset("h", "f1", "a").await.unwrap(), 1);
        assert_eq!(client.hset("h", "f1", "b").await.unwrap(), 0);
        assert_eq!(client.hset("h", "f2", "c").await.unwrap(), 1);
        let values: Vec<Option<String>> = client.hmget("h", vec!["f1", "f2", "f3"]).await.unwrap();
        assert_eq!(
            values,
            vec![Some("b".to_string()), Some("c".to_string()), None]
        );
        assert_eq!(client.hdel("h", vec!["f1", "f2"]).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_hget_missing() {
        let client = setup_client().await;
        let value: Option<String> = client.hget("missing", "field").await.unwrap();
        assert_eq!(value, None);
        client.hset("h", "present", "1").await.unwrap();
        let value: Option<String> = client.hget("h", "absent").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_hmset_then_hmget_roundtrip() {
        let client = setup_client().await;
        client
            .hmset("h", &[("f1", "v1"), ("f2", "v2")])
            .await
            .unwrap();
        let values: Vec<Option<String>> = client.hmget("h", vec!["f1", "f2"]).await.unwrap();
        assert_eq!(values, vec![Some("v1".to_string()), Some("v2".to_string())]);
    }

    #[tokio::test]
    async fn test_hset_multi_counts_new_fields() {
        let client = setup_client().await;
        client.hset("h", "f1", "old").await.unwrap();
        let added = client
            .hset_multi("h", &[("f1", "new"), ("f2", "x"), ("f3", "y")])
            .await
            .unwrap();
        assert_eq!(added, 2);
    }

    #[tokio::test]
    async fn test_hgetall() {
        let client = setup_client().await;
        client
            .hmset("h", &[("b", "2"), ("a", "1")])
            .await
            .unwrap();
        let all: std::collections::HashMap<String, String> = client.hgetall("h").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.get("a"), Some(&"1".to_string()));
        assert_eq!(all.get("b"), Some(&"2".to_string()));
    }

    #[tokio::test]
    async fn test_hdel_counts_only_existing() {
        let client = setup_client().await;
        client.hset("h", "f1", "v").await.unwrap();
        let removed = client.hdel("h", vec!["f1", "ghost"]).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(client.exists("h").await.unwrap(), 0);
    }
}

mod set_tests {
    use super::*;

    #[tokio::test]
    async fn test_sadd_counts_new_members() {
        let client = setup_client().await;
        assert_eq!(client.sadd("s", vec!["a", "b"]).await.unwrap(), 2);
        assert_eq!(client.sadd("s", vec!["b", "c"]).await.unwrap(), 1);
        assert_eq!(client.sadd("s", "a").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_smembers_sorted_union() {
        let client = setup_client().await;
        client.sadd("s", vec!["c", "a"]).await.unwrap();
        client.sadd("s", vec!["b", "a"]).await.unwrap();
        let members: Vec<String> = client.smembers("s").await.unwrap();
        assert_eq!(members, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_srem_counts_removed() {
        let client = setup_client().await;
        client.sadd("s", vec!["a", "b"]).await.unwrap();
        assert_eq!(client.srem("s", vec!["a", "ghost"]).await.unwrap(), 1);
        let members: Vec<String> = client.smembers("s").await.unwrap();
        assert_eq!(members, vec!["b"]);
    }

    #[tokio::test]
    async fn test_sismember() {
        let client = setup_client().await;
        client.sadd("s", "a").await.unwrap();
        assert!(client.sismember("s", "a").await.unwrap());
        assert!(!client.sismember("s", "b").await.unwrap());
        assert!(!client.sismember("missing", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_smembers_missing_key() {
        let client = setup_client().await;
        let members: Vec<String> = client.smembers("missing").await.unwrap();
        assert!(members.is_empty());
    }
}

mod key_tests {
    use super::*;

    #[tokio::test]
    async fn test_del_across_types() {
        let client = setup_client().await;
        client.set("str", "v").await.unwrap();
        client.rpush("list", "v").await.unwrap();
        client.hset("hash", "f", "v").await.unwrap();
        client.sadd("set", "m").await.unwrap();
        let removed = client
            .del(vec!["str", "list", "hash", "set", "ghost"])
            .await
            .unwrap();
        assert_eq!(removed, 4);
        assert_eq!(client.dbsize().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_del_then_retype() {
        let client = setup_client().await;
        client.set("key1", "v").await.unwrap();
        let err = client.lpush("key1", "item").await.unwrap_err();
        assert!(err.to_string().starts_with("WRONGTYPE"));
        client.del("key1").await.unwrap();
        assert_eq!(client.lpush("key1", "item").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_exists_counts_per_argument() {
        let client = setup_client().await;
        client.set("key1", "v").await.unwrap();
        assert_eq!(client.exists("key1").await.unwrap(), 1);
        assert_eq!(client.exists(vec!["key1", "key1", "ghost"]).await.unwrap(), 2);
        assert_eq!(client.exists("ghost").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ttl_states() {
        let client = setup_client().await;
        assert_eq!(client.ttl("ghost").await.unwrap(), -2);
        client.set("key1", "v").await.unwrap();
        assert_eq!(client.ttl("key1").await.unwrap(), -1);
        client.expire("key1", 30).await.unwrap();
        let ttl = client.ttl("key1").await.unwrap();
        assert!(ttl > 0 && ttl <= 30);
    }

    #[tokio::test]
    async fn test_expire_missing_key() {
        let client = setup_client().await;
        assert!(!client.expire("ghost", 10).await.unwrap());
    }

    #[tokio::test]
    async fn test_persist_removes_expiry() {
        let client = setup_client().await;
        client.set("key1", "v").await.unwrap();
        client.expire("key1", 60).await.unwrap();
        assert!(client.persist("key1").await.unwrap());
        assert_eq!(client.ttl("key1").await.unwrap(), -1);
        assert!(!client.persist("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_glob_patterns() {
        let client = setup_client().await;
        client.set("user:1", "a").await.unwrap();
        client.set("user:2", "b").await.unwrap();
        client.rpush("queue:jobs", "j").await.unwrap();
        client.hset("user:10", "f", "v").await.unwrap();

        let all: Vec<String> = client.keys("*").await.unwrap();
        assert_eq!(all, vec!["queue:jobs", "user:1", "user:10", "user:2"]);

        let users: Vec<String> = client.keys("user:*").await.unwrap();
        assert_eq!(users, vec!["user:1", "user:10", "user:2"]);

        let single: Vec<String> = client.keys("user:?").await.unwrap();
        assert_eq!(single, vec!["user:1", "user:2"]);

        let bracket: Vec<String> = client.keys("user:[12]").await.unwrap();
        assert_eq!(bracket, vec!["user:1", "user:2"]);
    }

    #[tokio::test]
    async fn test_flushdb() {
        let client = setup_client().await;
        client.set("key1", "v").await.unwrap();
        client.rpush("list", "v").await.unwrap();
        client.flushdb().await.unwrap();
        assert_eq!(client.dbsize().await.unwrap(), 0);
        let result: Option<String> = client.get("key1").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_ping_and_echo() {
        let client = setup_client().await;
        assert_eq!(client.ping().await.unwrap(), "PONG");
        assert_eq!(client.echo("hello").await.unwrap(), "hello");
    }
}

mod expiration_tests {
    use super::*;

    #[tokio::test]
    async fn test_expire_then_read_after_deadline() {
        let client = setup_client().await;
        client.set("foo", "bar").await.unwrap();
        let result: Option<String> = client.get("foo").await.unwrap();
        assert_eq!(result, Some("bar".to_string()));
        assert!(client.expire("foo", 1).await.unwrap());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let result: Option<String> = client.get("foo").await.unwrap();
        assert_eq!(result, None);
        assert_eq!(client.ttl("foo").await.unwrap(), -2);
        assert_eq!(client.exists("foo").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expired_key_masked_before_reap() {
        // A reap interval far longer than the TTL, so the read must mask
        // the dead row itself.
        let config = StorageConfig::new().with_reap_interval(Duration::from_secs(3600));
        let client = Client::open(config).await.unwrap();
        client.set("foo", "bar").await.unwrap();
        client.expire("foo", 1).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let result: Option<String> = client.get("foo").await.unwrap();
        assert_eq!(result, None);
        assert_eq!(client.ttl("foo").await.unwrap(), -2);
    }

    #[tokio::test]
    async fn test_expiry_applies_to_whole_list() {
        let client = setup_client().await;
        client.rpush("list", vec!["a", "b", "c"]).await.unwrap();
        client.expire("list", 1).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let range: Vec<String> = client.lrange("list", 0, -1).await.unwrap();
        assert!(range.is_empty());
        assert_eq!(client.llen("list").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_retype_after_expiry() {
        let client = setup_client().await;
        client.set("key1", "v").await.unwrap();
        client.expire("key1", 1).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(client.lpush("key1", "item").await.unwrap(), 1);
        let range: Vec<String> = client.lrange("key1", 0, -1).await.unwrap();
        assert_eq!(range, vec!["item"]);
    }
}

mod wrongtype_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_on_list() {
        let client = setup_client().await;
        client.lpush("list", "item").await.unwrap();
        let result: RedisResult<Option<String>> = client.get("list").await;
        assert!(result.unwrap_err().to_string().starts_with("WRONGTYPE"));
    }

    #[tokio::test]
    async fn test_hget_on_string() {
        let client = setup_client().await;
        client.set("key1", "v").await.unwrap();
        let result: RedisResult<Option<String>> = client.hget("key1", "f").await;
        assert!(result.unwrap_err().to_string().starts_with("WRONGTYPE"));
    }

    #[tokio::test]
    async fn test_sadd_on_string() {
        let client = setup_client().await;
        client.set("key1", "v").await.unwrap();
        let result = client.sadd("key1", "m").await;
        assert!(result.unwrap_err().to_string().starts_with("WRONGTYPE"));
    }

    #[tokio::test]
    async fn test_hset_on_list() {
        let client = setup_client().await;
        client.lpush("list", "item").await.unwrap();
        let result = client.hset("list", "f", "v").await;
        assert!(result.unwrap_err().to_string().starts_with("WRONGTYPE"));
    }

    #[tokio::test]
    async fn test_lpush_on_set() {
        let client = setup_client().await;
        client.sadd("s", "m").await.unwrap();
        let result = client.lpush("s", "item").await;
        assert!(result.unwrap_err().to_string().starts_with("WRONGTYPE"));
    }

    #[tokio::test]
    async fn test_sadd_on_hash() {
        let client = setup_client().await;
        client.hset("h", "f", "v").await.unwrap();
        let result = client.sadd("h", "m").await;
        assert!(result.unwrap_err().to_string().starts_with("WRONGTYPE"));
    }

    #[tokio::test]
    async fn test_rpoplpush_wrong_typed_destination() {
        let client = setup_client().await;
        client.rpush("src", "item").await.unwrap();
        client.set("dst", "v").await.unwrap();
        let result: RedisResult<Option<String>> = client.rpoplpush("src", "dst").await;
        assert!(result.unwrap_err().to_string().starts_with("WRONGTYPE"));
        // The source must be untouched.
        assert_eq!(client.llen("src").await.unwrap(), 1);
    }
}

mod transaction_tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_exec() {
        let client = setup_client().await;
        let results = client.multi().exec().await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_exec_applies_in_order() {
        let client = setup_client().await;
        let mut pipe = client.multi();
        pipe.set("key1", "v")
            .rpush("list", vec!["a", "b"])
            .lrange("list", 0, -1)
            .get("key1");
        let results = pipe.exec().await.unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(*results[0].as_ref().unwrap(), Value::Okay);
        assert_eq!(*results[1].as_ref().unwrap(), Value::Int(2));
        assert_eq!(
            *results[2].as_ref().unwrap(),
            Value::Array(vec![
                Value::String(b"a".to_vec()),
                Value::String(b"b".to_vec())
            ])
        );
        assert_eq!(*results[3].as_ref().unwrap(), Value::String(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_buffered_commands_not_observable() {
        let client = setup_client().await;
        let mut pipe = client.multi();
        pipe.set("key1", "v");
        let before: Option<String> = client.get("key1").await.unwrap();
        assert_eq!(before, None);
        pipe.exec().await.unwrap();
        let after: Option<String> = client.get("key1").await.unwrap();
        assert_eq!(after, Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_per_command_error_slot() {
        let client = setup_client().await;
        client.set("foo", "bar").await.unwrap();

        let mut pipe = client.multi();
        pipe.set("foo", "bar").lpush("foo", "abc").get("foo");
        let results = pipe.exec().await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(*results[0].as_ref().unwrap(), Value::Okay);
        let err = results[1].as_ref().unwrap_err();
        assert!(err.to_string().starts_with("WRONGTYPE"));
        assert_eq!(
            *results[2].as_ref().unwrap(),
            Value::String(b"bar".to_vec())
        );
    }

    #[tokio::test]
    async fn test_exec_strict_fails_on_first_error() {
        let client = setup_client().await;
        client.set("foo", "bar").await.unwrap();

        let mut pipe = client.multi();
        pipe.set("foo", "bar").lpush("foo", "abc").get("foo");
        let err = pipe.exec_strict().await.unwrap_err();
        assert!(err.to_string().starts_with("WRONGTYPE"));
    }

    #[tokio::test]
    async fn test_exec_strict_success_returns_values() {
        let client = setup_client().await;
        let mut pipe = client.multi();
        pipe.set("key1", "v").get("key1");
        let results = pipe.exec_strict().await.unwrap();
        assert_eq!(
            results,
            vec![Value::Okay, Value::String(b"v".to_vec())]
        );
    }

    #[tokio::test]
    async fn test_exec_matches_sequential_execution() {
        let client = setup_client().await;
        let mut pipe = client.multi();
        pipe.rpush("q", vec!["1", "2", "3"])
            .cmd("RPOPLPUSH", ("q", "active"))
            .cmd("EXPIRE", ("active", 100i64));
        pipe.exec().await.unwrap();

        let q: Vec<String> = client.lrange("q", 0, -1).await.unwrap();
        assert_eq!(q, vec!["1", "2"]);
        let active: Vec<String> = client.lrange("active", 0, -1).await.unwrap();
        assert_eq!(active, vec!["3"]);
        let ttl = client.ttl("active").await.unwrap();
        assert!(ttl > 0 && ttl <= 100);
    }
}

mod blocking_tests {
    use super::*;

    #[tokio::test]
    async fn test_brpoplpush_immediate() {
        let client = setup_client().await;
        client.rpush("src", "job").await.unwrap();
        let moved = client.brpoplpush("src", "dst", 1).await.unwrap();
        assert_eq!(moved, Some(b"job".to_vec()));
        let dst: Vec<String> = client.lrange("dst", 0, -1).await.unwrap();
        assert_eq!(dst, vec!["job"]);
    }

    #[tokio::test]
    async fn test_brpoplpush_wakes_on_push() {
        let client = setup_client().await;
        let waiter = client.clone();
        let handle =
            tokio::spawn(async move { waiter.brpoplpush("src", "dst", 5).await.unwrap() });

        tokio::time::sleep(Duration::from_millis(150)).await;
        client.rpush("src", "job").await.unwrap();

        let moved = handle.await.unwrap();
        assert_eq!(moved, Some(b"job".to_vec()));
        let dst: Vec<String> = client.lrange("dst", 0, -1).await.unwrap();
        assert_eq!(dst, vec!["job"]);
        assert_eq!(client.llen("src").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_brpoplpush_times_out() {
        let client = setup_client().await;
        let start = std::time::Instant::now();
        let moved = client.brpoplpush("src", "dst", 1).await.unwrap();
        assert_eq!(moved, None);
        assert!(start.elapsed() >= Duration::from_millis(900));
    }
}

mod persistence_tests {
    use super::*;

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let filename = path.to_str().unwrap().to_string();

        {
            let client = Client::open(StorageConfig::new().with_filename(&filename))
                .await
                .unwrap();
            client.set("key1", "persisted").await.unwrap();
            client.rpush("list", vec!["a", "b"]).await.unwrap();
            client.close();
        }

        let client = Client::open(StorageConfig::new().with_filename(&filename))
            .await
            .unwrap();
        let value: Option<String> = client.get("key1").await.unwrap();
        assert_eq!(value, Some("persisted".to_string()));
        let range: Vec<String> = client.lrange("list", 0, -1).await.unwrap();
        assert_eq!(range, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_prefix_isolates_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let filename = path.to_str().unwrap().to_string();

        let first = Client::open(
            StorageConfig::new()
                .with_filename(&filename)
                .with_table_prefix("app1_"),
        )
        .await
        .unwrap();
        let second = Client::open(
            StorageConfig::new()
                .with_filename(&filename)
                .with_table_prefix("app2_"),
        )
        .await
        .unwrap();

        first.set("key1", "one").await.unwrap();
        let other: Option<String> = second.get("key1").await.unwrap();
        assert_eq!(other, None);
        let own: Option<String> = first.get("key1").await.unwrap();
        assert_eq!(own, Some("one".to_string()));
    }
}
