use super::LinkedList;

const ALPHABET: usize = 26;

#[derive(Debug, Default, Clone)]
struct TrieNode {
    children: [Option<Box<TrieNode>>; ALPHABET],
    terminal: bool,
}

fn slot(c: char) -> Option<usize> {
    c.is_ascii_lowercase().then(|| (c as u8 - b'a') as usize)
}

/// Prefix tree over lowercase ASCII letters.
///
/// Words are lowercased on the way in. The first character outside `a`-`z`
/// ends the word, so `"rust2024"` is stored as `"rust"`. The tree only grows.
#[derive(Debug, Default, Clone)]
pub struct Trie {
    root: TrieNode,
    words: usize,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: &str) {
        let mut node = &mut self.root;
        let mut depth = 0;

        for c in word.to_lowercase().chars() {
            let Some(index) = slot(c) else {
                break;
            };
            node = node.children[index].get_or_insert_with(Box::default);
            depth += 1;
        }

        if depth > 0 && !node.terminal {
            node.terminal = true;
            self.words += 1;
        }
    }

    pub fn search(&self, word: &str) -> bool {
        self.find_node(word).is_some_and(|node| node.terminal)
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.find_node(prefix).is_some()
    }

    /// Every stored word starting with `prefix`, in alphabetical order.
    /// An empty prefix matches nothing.
    pub fn words_with_prefix(&self, prefix: &str) -> LinkedList<String> {
        let mut results = LinkedList::new();
        if let Some(node) = self.find_node(prefix) {
            let mut buffer = prefix.to_lowercase();
            Self::collect(node, &mut buffer, &mut results);
        }
        results
    }

    /// Number of distinct words stored.
    pub fn len(&self) -> usize {
        self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words == 0
    }

    fn find_node(&self, prefix: &str) -> Option<&TrieNode> {
        if prefix.is_empty() {
            return None;
        }

        let mut node = &self.root;
        for c in prefix.to_lowercase().chars() {
            node = node.children[slot(c)?].as_deref()?;
        }
        Some(node)
    }

    fn collect(node: &TrieNode, buffer: &mut String, results: &mut LinkedList<String>) {
        if node.terminal {
            results.append(buffer.clone());
        }

        for (index, child) in node.children.iter().enumerate() {
            if let Some(child) = child {
                buffer.push((b'a' + index as u8) as char);
                Self::collect(child, buffer, results);
                buffer.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(trie: &Trie, prefix: &str) -> Vec<String> {
        trie.words_with_prefix(prefix).iter().cloned().collect()
    }

    #[test]
    fn test_insert_search_prefix() {
        let mut trie = Trie::new();
        trie.insert("Deploy");
        trie.insert("design");
        trie.insert("des");

        assert!(trie.search("deploy"));
        assert!(trie.search("DES"));
        assert!(!trie.search("de"));
        assert!(trie.has_prefix("de"));
        assert!(!trie.has_prefix("dx"));
        assert_eq!(trie.len(), 3);
    }

    #[test]
    fn test_empty_input_is_invalid() {
        let mut trie = Trie::new();
        trie.insert("");
        trie.insert("42");
        assert!(trie.is_empty());

        trie.insert("task");
        assert!(!trie.search(""));
        assert!(!trie.has_prefix(""));
        assert!(words(&trie, "").is_empty());
    }

    #[test]
    fn test_invalid_char_truncates_word() {
        let mut trie = Trie::new();
        trie.insert("api-gateway");
        assert!(trie.search("api"));
        assert!(!trie.has_prefix("apig"));
    }

    #[test]
    fn test_completions_sorted() {
        let mut trie = Trie::new();
        for word in ["setup", "server", "search", "seed", "other"] {
            trie.insert(word);
        }
        trie.insert("server");

        assert_eq!(words(&trie, "se"), vec!["search", "seed", "server", "setup"]);
        assert_eq!(words(&trie, "SER"), vec!["server"]);
        assert!(words(&trie, "zz").is_empty());
        assert_eq!(trie.len(), 5);
    }
}
