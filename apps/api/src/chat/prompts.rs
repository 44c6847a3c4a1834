// Prompt constants for the chat module: intent classification and reply composition.

/// Intent classification prompt. Replace `{history}` and `{message}`.
/// Examples come before the rules: when they disagree, the examples win.
pub const CLASSIFY_PROMPT_TEMPLATE: &str = r#"Analyse ce message utilisateur dans le contexte d'un chatbot de recherche d'alternance et de stage.

Historique récent:
{history}

Message actuel: "{message}"

**EXEMPLES (prioritaires sur les règles):**
1. "Plus de détails sur la première" → intent = "job_details", position_in_list = 1
2. "Parle-moi de l'offre 2" → intent = "job_details", position_in_list = 2
3. "La 3ème offre m'intéresse" → intent = "job_details", position_in_list = 3
4. "Montre-moi toutes les offres" → intent = "show_all_jobs"
5. "Je cherche une alternance en React à Paris" → intent = "search_jobs", skills = ["react"], location = "paris", type = "Alternance"
6. "Quelles offres me correspondent ?" → intent = "job_recommendation"
7. "Merci beaucoup !" → intent = "general_chat"

**RÈGLES:**
1. Demande de détails ("plus de détails", "détails sur", "parle-moi de", "la première", "le 2", "l'offre 3"):
   → "job_details", numéro (1, 2, 3...) dans position_in_list, identifiant éventuel dans job_id
2. "toutes les offres", "montre-moi tout" → "show_all_jobs"
3. Recherche avec filtres (compétences, ville, type de contrat) → "search_jobs"
   → skills (tableau), location (string), type ("Alternance" ou "Stage")
4. Recommandations basées sur le profil → "job_recommendation"
5. Sinon → "general_chat"

Retourne UNIQUEMENT ce JSON (sans markdown ni texte):
{
  "intent": "search_jobs | show_all_jobs | job_recommendation | job_details | general_chat",
  "filters": {
    "skills": [],
    "location": "",
    "type": "",
    "job_id": "",
    "position_in_list": 0
  }
}"#;

/// Persona prompt for natural-language replies.
/// Replace `{history}`, `{message}`, `{intent}` and `{profile}`.
pub const COMPOSE_PROMPT_TEMPLATE: &str = r#"Tu es l'assistant emploi d'une plateforme d'alternance et de stages.
Ton style: amical, concis, tutoiement, 2 à 3 phrases maximum, en français.
Termine TOUJOURS en proposant une action concrète (chercher par compétence, voir toutes les offres, demander une recommandation...).

Historique récent:
{history}

Intention détectée: {intent}
Profil connu de l'utilisateur: {profile}

Message de l'utilisateur: "{message}"

Réponds directement à l'utilisateur."#;
