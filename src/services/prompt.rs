//! Prompt text for the image model.

use crate::models::ad::AdRequest;

/// Build the image generation prompt for an ad request.
pub fn build_prompt(req: &AdRequest) -> String {
    format!(
        r#"High-quality lifestyle advertising photograph.

Product:
{product}

Person:
{persona}

Scene:
{scene}

Interaction:
Person is {interaction} the product using their right hand.

Emotion:
{emotion}

Visual style:
{visual_style}

Text on image:
A short, catchy tagline reading: "{tagline}"

The text is placed slightly below the top edge,
centered horizontally, with generous padding.

The text uses elegant, flowing, cursive or italic typography,
with smooth curves and a premium, stylish feel.
The lettering looks modern, clean, and visually pleasing.

High contrast so the text is clearly readable.
The text is fully visible and not touching the edges of the image.

Rules:
- Photorealistic
- Professional advertising photography
- Natural human posture
- No distorted hands
- No extra fingers
- No excessive text (only the tagline)
"#,
        product = req.product,
        persona = req.persona,
        scene = req.scene,
        interaction = req.interaction,
        emotion = req.emotion,
        visual_style = req.visual_style,
        tagline = req.tagline,
    )
}
