use crate::discord::Message;

/// 关键词过滤器：不区分大小写的子串匹配
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    /// 已小写化、去空白、去重（保持配置顺序）
    keywords: Vec<String>,
}

impl KeywordMatcher {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let mut normalized: Vec<String> = Vec::with_capacity(keywords.len());
        for kw in keywords {
            let kw = kw.as_ref().trim().to_lowercase();
            if !kw.is_empty() && !normalized.contains(&kw) {
                normalized.push(kw);
            }
        }
        Self {
            keywords: normalized,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// 返回文本命中的全部关键词（按配置顺序）
    pub fn matches(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|kw| text.contains(kw.as_str()))
            .cloned()
            .collect()
    }

    /// 保留命中任一关键词的消息，并写入 matched_keywords；不改变顺序
    pub fn filter(&self, messages: Vec<Message>) -> Vec<Message> {
        messages
            .into_iter()
            .filter_map(|mut msg| {
                let hits = self.matches(&msg.content);
                if hits.is_empty() {
                    return None;
                }
                msg.matched_keywords = hits;
                Some(msg)
            })
            .collect()
    }
}
