//! 回执文档 - 业务能力层
//!
//! 负责写出渲染好的 PDF、打开已有 PDF、把图片追加为末尾页面

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::{AppError, AppResult, DocumentError};
use crate::infrastructure::DocumentRenderer;

/// 页面可以从父节点继承的属性
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// 已打开的回执 PDF
///
/// 整个文件在 `open` 时读入内存，不持有文件句柄；
/// `save` 消耗自身，写完即关闭文件
pub struct ReceiptDocument {
    path: PathBuf,
    doc: Document,
}

impl ReceiptDocument {
    /// 把渲染结果写入新文件（已存在则覆盖）
    pub fn create(path: &Path, pdf_bytes: &[u8]) -> AppResult<()> {
        if pdf_bytes.is_empty() {
            return Err(DocumentError::EmptyRender(path.display().to_string()).into());
        }
        std::fs::write(path, pdf_bytes)
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))
    }

    /// 打开已有 PDF
    pub fn open(path: &Path) -> AppResult<Self> {
        let doc = Document::load(path).map_err(|e| AppError::pdf(path.display().to_string(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// 依次把图片追加为末尾页面，返回追加的页数
    ///
    /// 每张图片先渲染为单页 PDF，再合并到当前文档
    pub async fn append_images<R: DocumentRenderer + ?Sized>(
        &mut self,
        images: &[PathBuf],
        renderer: &R,
    ) -> AppResult<usize> {
        let mut appended = 0;
        for image in images {
            let bytes = std::fs::read(image)
                .map_err(|e| AppError::file_read_failed(image.display().to_string(), e))?;
            let file_name = image
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();

            let html = image_page_html(&file_name, image_mime(image), &bytes);
            let page_pdf = renderer.render_html(&html).await?;
            appended += self.append_pdf_pages(&page_pdf)?;
            debug!("已追加图片页: {}", file_name);
        }
        Ok(appended)
    }

    /// 把另一份 PDF 的全部页面按顺序追加到末尾，返回追加的页数
    pub fn append_pdf_pages(&mut self, pdf_bytes: &[u8]) -> AppResult<usize> {
        let path = self.path.display().to_string();
        let pdf_err = |e: lopdf::Error| AppError::pdf(path.clone(), e);

        let mut extra = Document::load_mem(pdf_bytes).map_err(pdf_err)?;

        // 合并后页面脱离原来的页树，先把继承属性落到页面自身
        let original_pages: Vec<ObjectId> = extra.get_pages().into_values().collect();
        for page_id in original_pages {
            flatten_inherited_attributes(&mut extra, page_id).map_err(pdf_err)?;
        }

        extra.renumber_objects_with(self.doc.max_id + 1);
        let extra_pages: Vec<ObjectId> = extra.get_pages().into_values().collect();
        if extra_pages.is_empty() {
            return Err(DocumentError::Malformed {
                path: path.clone(),
                message: "待追加的文档没有页面".to_string(),
            }
            .into());
        }

        let pages_root = self.pages_root().map_err(pdf_err)?;
        self.doc.objects.extend(extra.objects);
        self.doc.max_id = self
            .doc
            .objects
            .keys()
            .map(|(id, _)| *id)
            .max()
            .unwrap_or(self.doc.max_id);

        for &page_id in &extra_pages {
            self.doc
                .get_dictionary_mut(page_id)
                .map_err(pdf_err)?
                .set("Parent", pages_root);
        }

        let root = self.doc.get_dictionary_mut(pages_root).map_err(pdf_err)?;
        let count = root.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        root.get_mut(b"Kids")
            .and_then(Object::as_array_mut)
            .map_err(pdf_err)?
            .extend(extra_pages.iter().map(|&id| Object::Reference(id)));
        root.set("Count", count + extra_pages.len() as i64);

        // 旧的 Catalog / Pages 节点已无引用
        self.doc.prune_objects();
        Ok(extra_pages.len())
    }

    /// 写回原路径并释放文档
    pub fn save(mut self) -> AppResult<PathBuf> {
        let file = self
            .doc
            .save(&self.path)
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;
        drop(file);
        Ok(self.path)
    }

    fn pages_root(&self) -> lopdf::Result<ObjectId> {
        let catalog_id = self.doc.trailer.get(b"Root")?.as_reference()?;
        self.doc.get_dictionary(catalog_id)?.get(b"Pages")?.as_reference()
    }
}

/// 把父节点上的可继承属性复制到页面字典
fn flatten_inherited_attributes(doc: &mut Document, page_id: ObjectId) -> lopdf::Result<()> {
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();
    let mut parent = doc
        .get_dictionary(page_id)?
        .get(b"Parent")
        .and_then(Object::as_reference)
        .ok();

    // 页树深度有限，防止损坏文件中的循环引用
    let mut depth = 0;
    while let Some(node_id) = parent {
        if depth >= 32 {
            break;
        }
        depth += 1;

        let page = doc.get_dictionary(page_id)?;
        let node = doc.get_dictionary(node_id)?;
        for key in INHERITABLE_KEYS {
            if page.has(key) || inherited.iter().any(|(k, _)| *k == key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                inherited.push((key, value.clone()));
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    let page = doc.get_dictionary_mut(page_id)?;
    for (key, value) in inherited {
        page.set(key, value);
    }
    Ok(())
}

/// 单张图片占满一页的 HTML
pub fn image_page_html(file_name: &str, mime: &str, bytes: &[u8]) -> String {
    format!(
        concat!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\">",
            "<style>@page {{ margin: 12mm; }} body {{ margin: 0; text-align: center; }}",
            " img {{ max-width: 100%; max-height: 250mm; }}</style></head>",
            "<body><img alt=\"{}\" src=\"data:{};base64,{}\"></body></html>"
        ),
        file_name,
        mime,
        BASE64.encode(bytes)
    )
}

fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_page_html_embeds_data_uri() {
        let html = image_page_html("robot-1.png", "image/png", b"\x89PNG");
        assert!(html.contains("alt=\"robot-1.png\""));
        assert!(html.contains("src=\"data:image/png;base64,iVBORw==\""));
    }

    #[test]
    fn test_image_mime_by_extension() {
        assert_eq!(image_mime(Path::new("a.PNG")), "image/png");
        assert_eq!(image_mime(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(image_mime(Path::new("a")), "image/png");
    }

    #[test]
    fn test_create_rejects_empty_render() {
        let err = ReceiptDocument::create(Path::new("unused.pdf"), &[]).unwrap_err();
        assert!(matches!(err, AppError::Document(DocumentError::EmptyRender(_))));
    }
}
