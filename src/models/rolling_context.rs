//! 滚动上下文
//!
//! 保存"到目前为止写了什么"的摘要，供下一次调用保持连贯。
//! 只保留累积文本末尾固定字符数，是有意的有损压缩。

/// 有界的滚动上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingContext {
    buf: String,
    capacity: usize,
}

impl RollingContext {
    /// `capacity` 为最多保留的字符数
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: String::new(),
            capacity,
        }
    }

    /// 用新的内容替换全部上下文
    pub fn seed(&mut self, text: &str) {
        self.buf = tail_chars(text, self.capacity).to_string();
    }

    /// 追加一段内容，超出容量时丢弃最早的部分
    pub fn push(&mut self, text: &str) {
        self.buf.push_str(text);
        let trimmed = tail_chars(&self.buf, self.capacity);
        if trimmed.len() != self.buf.len() {
            self.buf = trimmed.to_string();
        }
    }

    /// 末尾 `max_chars` 个字符，用于嵌入下一次指令
    pub fn window(&self, max_chars: usize) -> &str {
        tail_chars(&self.buf, max_chars)
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// 当前字符数，不会超过容量
    pub fn char_len(&self) -> usize {
        self.buf.chars().count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// 末尾 `n` 个字符（按 char 边界截取）
pub fn tail_chars(text: &str, n: usize) -> &str {
    let total = text.chars().count();
    if total <= n {
        return text;
    }
    match text.char_indices().nth(total - n) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

/// 开头 `n` 个字符（按 char 边界截取）
pub fn head_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
