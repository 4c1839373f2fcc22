//! 目录组装
//!
//! 目录只由最终大纲和章节编号决定，不依赖生成内容。

use crate::models::Outline;
use crate::profile::Profile;

/// 由大纲生成目录
///
/// 引言 + 每章（章标题 + 各小节） + 档位固定的结尾条目。
pub fn build_table_of_contents(profile: Profile, outline: &Outline) -> Vec<String> {
    let mut toc = vec![profile.toc_opening().to_string()];

    for (ci, chapter) in outline.active_chapters().enumerate() {
        let chapter_number = ci + 1;
        toc.push(profile.toc_chapter_heading(chapter_number, &chapter.title));
        toc.extend(
            chapter
                .subsections
                .iter()
                .enumerate()
                .map(|(si, sub)| format!("{}.{} {}", chapter_number, si + 1, sub)),
        );
    }

    toc.extend(profile.toc_trailer().iter().map(|s| s.to_string()));
    toc
}
