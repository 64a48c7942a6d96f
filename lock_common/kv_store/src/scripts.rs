//! Lua scripts executed server side by the Redis store

/// Lua script for conditional delete
/// Returns -1 when the key is absent, 0 when the value does not match, 1 after deleting
pub const COMPARE_AND_DELETE: &str = r#"
    local current = redis.call('get', KEYS[1])
    if not current then
        return -1
    end
    if current == ARGV[1] then
        redis.call('del', KEYS[1])
        return 1
    end
    return 0
"#;
