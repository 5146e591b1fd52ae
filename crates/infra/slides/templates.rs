//! HTML slide templates screenshotted by the renderer. Vertical 9:16
//! layout, no external assets so the pages load instantly in a headless
//! browser.

pub fn title_slide(topic: &str) -> String {
    let topic = escape_html(topic);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<style>
  body {{
    margin: 0;
    width: 1080px;
    height: 1920px;
    display: flex;
    align-items: center;
    justify-content: center;
    background: linear-gradient(160deg, #1a2a6c 0%, #b21f1f 55%, #fdbb2d 100%);
    font-family: 'Helvetica Neue', Arial, sans-serif;
  }}
  .title {{
    color: #ffffff;
    font-size: 110px;
    font-weight: 800;
    text-align: center;
    padding: 0 80px;
    text-shadow: 0 8px 30px rgba(0, 0, 0, 0.6);
    line-height: 1.2;
  }}
</style>
</head>
<body>
  <div class="title">{topic}</div>
</body>
</html>"#
    )
}

pub fn item_slide(rank: u8, name: &str, tagline: &str) -> String {
    let name = escape_html(name);
    let tagline = escape_html(tagline);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<style>
  body {{
    margin: 0;
    width: 1080px;
    height: 1920px;
    display: flex;
    flex-direction: column;
    align-items: center;
    justify-content: center;
    background: linear-gradient(200deg, #0f2027 0%, #203a43 50%, #2c5364 100%);
    font-family: 'Helvetica Neue', Arial, sans-serif;
    color: #ffffff;
  }}
  .rank {{
    font-size: 260px;
    font-weight: 900;
    color: #fdbb2d;
    text-shadow: 0 10px 40px rgba(0, 0, 0, 0.7);
  }}
  .name {{
    font-size: 96px;
    font-weight: 700;
    text-align: center;
    padding: 0 60px;
  }}
  .tagline {{
    font-size: 52px;
    font-weight: 400;
    color: #d0d8e0;
    text-align: center;
    padding: 40px 100px 0;
  }}
</style>
</head>
<body>
  <div class="rank">#{rank}</div>
  <div class="name">{name}</div>
  <div class="tagline">{tagline}</div>
</body>
</html>"#
    )
}

pub fn cta_slide(topic: &str) -> String {
    let topic = escape_html(topic);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<style>
  body {{
    margin: 0;
    width: 1080px;
    height: 1920px;
    display: flex;
    flex-direction: column;
    align-items: center;
    justify-content: center;
    background: linear-gradient(160deg, #23074d 0%, #cc5333 100%);
    font-family: 'Helvetica Neue', Arial, sans-serif;
    color: #ffffff;
    text-align: center;
  }}
  .question {{
    font-size: 88px;
    font-weight: 800;
    padding: 0 80px;
    line-height: 1.25;
  }}
  .subscribe {{
    font-size: 64px;
    font-weight: 700;
    margin-top: 120px;
    padding: 40px 90px;
    border: 6px solid #ffffff;
    border-radius: 80px;
  }}
  .topic {{
    font-size: 40px;
    color: #e8d8ff;
    margin-top: 140px;
  }}
</style>
</head>
<body>
  <div class="question">Which one surprised you the most?</div>
  <div class="subscribe">SUBSCRIBE for more Top 10s</div>
  <div class="topic">{topic}</div>
</body>
</html>"#
    )
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_slide_embeds_topic() {
        let html = title_slide("Top 10 Rivers");
        assert!(html.contains("Top 10 Rivers"));
        assert!(html.contains("1920px"));
    }

    #[test]
    fn item_slide_embeds_rank_name_tagline() {
        let html = item_slide(7, "Danube", "Ten countries, one river");
        assert!(html.contains("#7"));
        assert!(html.contains("Danube"));
        assert!(html.contains("Ten countries, one river"));
    }

    #[test]
    fn markup_in_names_is_escaped() {
        let html = item_slide(1, "<script>alert(1)</script>", "a & b");
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
    }
}
